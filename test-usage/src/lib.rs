use std::{cell::RefCell, collections::HashMap};

use rstyled::{RegistryOptions, StyleHost, StyleRegistry, Template};

pub struct Card {
    pub padding: u32,
    pub accent: &'static str,
}

pub fn card_style() -> Template<Card> {
    rstyled::css!(
        r#"
        padding: ${|c: &Card| c.padding}px;
        border: 1px solid ${|c: &Card| c.accent};
        &:hover {
            border-color: black;
        }
        & > h1 {
            color: ${|c: &Card| c.accent};
        }
    "#
    )
}

/// Document that keeps style text in a map, keyed by container id.
#[derive(Default)]
pub struct TextDocument {
    containers: RefCell<Vec<String>>,
    head: RefCell<Vec<usize>>,
}

impl TextDocument {
    /// Concatenated text of attached containers.
    pub fn head_text(&self) -> String {
        let containers = self.containers.borrow();
        self.head
            .borrow()
            .iter()
            .map(|id| containers[*id].as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl StyleHost for TextDocument {
    type Node = usize;

    fn create_container(&self) -> usize {
        let mut containers = self.containers.borrow_mut();
        containers.push(String::new());
        containers.len() - 1
    }
    fn attach(&self, node: &usize) {
        self.head.borrow_mut().push(*node);
    }
    fn detach(&self, node: &usize) {
        self.head.borrow_mut().retain(|n| n != node);
    }
    fn text_content(&self, node: &usize) -> Option<String> {
        self.containers.borrow().get(*node).cloned()
    }
    fn set_text_content(&self, node: &usize, text: &str) {
        self.containers.borrow_mut()[*node] = text.to_owned();
    }
}

pub fn text_registry() -> StyleRegistry<TextDocument> {
    StyleRegistry::with_options(
        TextDocument::default(),
        RegistryOptions {
            class_prefix: "card".into(),
            seed: Some(11),
            ..Default::default()
        },
    )
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn render_card_style() {
        let raw = card_style().render(&Card {
            padding: 8,
            accent: "teal",
        });
        let registry = text_registry();
        let key = rstyled::transform(&raw).unwrap();
        let lease = registry.acquire(&key);
        assert!(lease.sync());

        let class = lease.class_name().to_owned();
        assert!(class.starts_with("card-"));
        let head = registry.with_host(|doc| doc.head_text());
        let expected = format!(
            ".{class}{{padding: 8px;\n        border: 1px solid teal;}}\n\
             .{class}:hover{{border-color: black;}}\n\
             .{class} > h1{{color: teal;}}"
        );
        assert_eq!(head, expected);

        drop(lease);
        assert_eq!(registry.with_host(|doc| doc.head_text()), "");
    }

    #[test]
    fn same_props_share_container() {
        let registry = text_registry();
        let template = card_style();
        let render = |padding| {
            let raw = template.render(&Card {
                padding,
                accent: "red",
            });
            registry.acquire(&rstyled::transform(&raw).unwrap())
        };
        let first = render(4);
        let second = render(4);
        let third = render(6);
        assert_eq!(first.class_name(), second.class_name());
        assert_ne!(first.class_name(), third.class_name());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn compile_time_checked_template() {
        let template: Template = rstyled::css!("display: flex; &::after { content: \"&\"; }");
        let rules = rstyled::parse_rules(&template.flatten()).unwrap();
        assert_eq!(rules.root, "display: flex;");
        assert_eq!(rules.nested.len(), 1);
        assert_eq!(rules.nested[0].selector, "::after");
        assert_eq!(rules.nested[0].content, "content: \"&\";");
    }
}
