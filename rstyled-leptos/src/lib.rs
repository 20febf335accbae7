use std::{cell::RefCell, rc::Rc};

use leptos::{
    create_memo, create_render_effect, on_cleanup, provide_context, use_context, Memo, SignalGet,
};
use rstyled_core::{
    merge_classes, transform, CanonicalText, ClassProp, Result, StyleHost, StyleLease,
    StyleRegistry, Template,
};

mod dom;
pub use dom::DomHost;

thread_local! {
    static REGISTRY: StyleRegistry<DomHost> = StyleRegistry::new(DomHost);
}

/// Registry shared by the whole application.
/// Created on first use and lives until the end of the process.
pub fn global_registry() -> StyleRegistry<DomHost> {
    REGISTRY.with(Clone::clone)
}

#[derive(Clone)]
struct RegistryContext(StyleRegistry<DomHost>);

/// Override registry for this component and its children.
pub fn provide_style_registry(registry: StyleRegistry<DomHost>) {
    provide_context(RegistryContext(registry));
}

/// Registry from context, or the global one.
pub fn use_registry() -> StyleRegistry<DomHost> {
    use_context::<RegistryContext>()
        .map(|ctx| ctx.0)
        .unwrap_or_else(global_registry)
}

///
/// Register style of this component instance and return its class name.
///
/// Style container is attached to `document.head` while at least one component uses the same style,
/// and detached when the last of them is cleaned up.
/// Template that fails to transform is returned as error, and registry is not touched.
///
/// # Example:
/// ```no_build
/// use leptos::*;
///
/// #[component]
/// fn my_component() -> impl IntoView {
///     let class = rstyled_leptos::use_style(&rstyled::css!(
///         "color: red; &:hover { color: blue; }"
///     ))
///     .unwrap_or_default();
///     view! { <div class=class>"Hello"</div> }
/// }
/// ```
pub fn use_style(template: &Template) -> Result<String> {
    use_style_text(&template.flatten())
}

pub fn use_style_text(raw: &str) -> Result<String> {
    use_style_in(&use_registry(), raw)
}

/// Same as [`use_style_text`] but with explicit registry.
pub fn use_style_in<H>(registry: &StyleRegistry<H>, raw: &str) -> Result<String>
where
    H: StyleHost + 'static,
{
    let key = transform(raw)?;
    let class_name = registry.entry(&key);
    mount_style(registry.clone(), move || Some(key.clone()));
    Ok(class_name)
}

///
/// Reactive version of [`use_style_text`].
/// `raw` is tracked, when its output changes, component switches to the new style.
/// New style is acquired before the previous one is released,
/// so shared containers are not detached in between.
///
/// If new text fails to transform, memo contains error and previous style stays mounted.
pub fn use_reactive_style(raw: impl Fn() -> String + 'static) -> Memo<Result<String>> {
    use_reactive_style_in(&use_registry(), raw)
}

pub fn use_reactive_style_in<H>(
    registry: &StyleRegistry<H>,
    raw: impl Fn() -> String + 'static,
) -> Memo<Result<String>>
where
    H: StyleHost + 'static,
{
    let key = create_memo(move |_| transform(&raw()));
    mount_style(registry.clone(), move || key.get().ok());

    let registry = registry.clone();
    create_memo(move |_| key.get().map(|key| registry.entry(&key)))
}

///
/// Wrap component, so it receives generated class in its props.
/// Template is rendered against props of each instance,
/// and generated class is appended to the class that caller provided.
///
/// # Example:
/// ```no_build
/// struct ButtonProps { class: Option<String>, primary: bool }
///
/// let styled_button = rstyled_leptos::styled(
///     button,
///     rstyled::css!("color: ${|p: &ButtonProps| if p.primary { "blue" } else { "gray" }};"),
/// );
/// ```
pub fn styled<P, V, F>(component: F, template: Template<P>) -> impl Fn(P) -> Result<V>
where
    P: ClassProp,
    F: Fn(P) -> V,
{
    move |props| styled_in(&use_registry(), &component, &template, props)
}

/// Render one instance of styled component with explicit registry.
pub fn styled_in<H, P, V>(
    registry: &StyleRegistry<H>,
    component: impl FnOnce(P) -> V,
    template: &Template<P>,
    mut props: P,
) -> Result<V>
where
    H: StyleHost + 'static,
    P: ClassProp,
{
    // Dynamic insertions are evaluated before registry is touched.
    let raw = template.render(&props);
    let class_name = use_style_in(registry, &raw)?;
    let class = merge_classes([props.class(), Some(class_name.as_str())]);
    props.set_class(class);
    Ok(component(props))
}

/// Keep a lease for current key, until owner is cleaned up.
/// `None` keeps previous lease.
fn mount_style<H>(registry: StyleRegistry<H>, key: impl Fn() -> Option<CanonicalText> + 'static)
where
    H: StyleHost + 'static,
{
    let lease: Rc<RefCell<Option<StyleLease<H>>>> = Rc::default();
    let current = lease.clone();
    // Render effect runs synchronously, before the view is mounted and painted.
    create_render_effect(move |_| {
        let Some(key) = key() else {
            return;
        };
        let mut current = current.borrow_mut();
        if current.as_ref().map(|lease| lease.key()) != Some(&key) {
            // previous lease is released after the new one is acquired
            *current = Some(registry.acquire(&key));
        }
        if let Some(lease) = current.as_ref() {
            lease.sync();
        }
    });
    on_cleanup(move || {
        lease.borrow_mut().take();
    });
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, collections::HashMap};

    use leptos::{
        as_child_of_current_owner, create_runtime, create_rw_signal, SignalGetUntracked, SignalSet,
    };
    use pretty_assertions::assert_eq;
    use rstyled_core::{Error, Insertion, RegistryOptions};

    use super::*;

    #[derive(Default)]
    struct MemoryHost {
        next_node: Cell<usize>,
        attached: RefCell<Vec<usize>>,
        contents: RefCell<HashMap<usize, String>>,
    }

    impl StyleHost for MemoryHost {
        type Node = usize;

        fn create_container(&self) -> usize {
            let node = self.next_node.get();
            self.next_node.set(node + 1);
            node
        }
        fn attach(&self, node: &usize) {
            self.attached.borrow_mut().push(*node);
        }
        fn detach(&self, node: &usize) {
            self.attached.borrow_mut().retain(|n| n != node);
        }
        fn text_content(&self, node: &usize) -> Option<String> {
            self.contents.borrow().get(node).cloned()
        }
        fn set_text_content(&self, node: &usize, text: &str) {
            self.contents.borrow_mut().insert(*node, text.to_owned());
        }
    }

    fn registry() -> StyleRegistry<MemoryHost> {
        StyleRegistry::with_options(
            MemoryHost::default(),
            RegistryOptions {
                seed: Some(3),
                ..Default::default()
            },
        )
    }

    #[test]
    fn use_style_mounts_and_syncs() {
        let runtime = create_runtime();
        let registry = registry();

        let class_name = use_style_in(&registry, "color: red; &:hover{color: blue;}").unwrap();
        let key = transform("color: red; &:hover{color: blue;}").unwrap();
        assert_eq!(registry.ref_count(&key), Some(1));
        assert!(registry.is_attached(&key));
        let content = registry.with_host(|h| h.contents.borrow()[&0].clone());
        assert_eq!(
            content,
            format!(".{class_name}{{color: red;}}\n.{class_name}:hover{{color: blue;}}")
        );

        let second = use_style_in(&registry, "color: red; &:hover{color: blue;}").unwrap();
        assert_eq!(second, class_name);
        assert_eq!(registry.ref_count(&key), Some(2));
        assert_eq!(registry.with_host(|h| h.attached.borrow().len()), 1);

        runtime.dispose();
    }

    #[test]
    fn style_released_when_owner_disposed() {
        let runtime = create_runtime();
        let registry = registry();
        let key = transform("color: red;").unwrap();

        let mount = {
            let registry = registry.clone();
            as_child_of_current_owner(move |_: ()| use_style_in(&registry, "color: red;"))
        };
        let (first, first_owner) = mount(());
        let (second, second_owner) = mount(());
        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(registry.ref_count(&key), Some(2));

        drop(first_owner);
        assert_eq!(registry.ref_count(&key), Some(1));
        assert!(registry.is_attached(&key));

        drop(second_owner);
        assert_eq!(registry.ref_count(&key), Some(0));
        assert!(!registry.is_attached(&key));
        assert!(registry.with_host(|h| h.attached.borrow().is_empty()));

        runtime.dispose();
    }

    #[test]
    fn malformed_template_doesnt_touch_registry() {
        let runtime = create_runtime();
        let registry = registry();

        let error = use_style_in(&registry, "color: red; &:hover{color: blue;").unwrap_err();
        assert_eq!(error, Error::UnterminatedBlock { offset: 12 });
        assert!(registry.is_empty());

        runtime.dispose();
    }

    #[test]
    fn reactive_style_switches_entries() {
        let runtime = create_runtime();
        let registry = registry();

        let color = create_rw_signal("red");
        let class = use_reactive_style_in(&registry, move || format!("color: {};", color.get()));
        let red = transform("color: red;").unwrap();
        let blue = transform("color: blue;").unwrap();

        let red_class = class.get_untracked().unwrap();
        assert_eq!(registry.class_name(&red), Some(red_class.clone()));
        assert!(registry.is_attached(&red));

        color.set("blue");
        assert_eq!(class.get_untracked(), Ok(registry.entry(&blue)));
        assert!(registry.is_attached(&blue));
        assert!(!registry.is_attached(&red));

        color.set("red");
        assert_eq!(class.get_untracked(), Ok(red_class));

        runtime.dispose();
    }

    struct ButtonProps {
        class: Option<String>,
        primary: bool,
    }

    impl ClassProp for ButtonProps {
        fn class(&self) -> Option<&str> {
            self.class.as_deref()
        }
        fn set_class(&mut self, class: String) {
            self.class = Some(class);
        }
    }

    fn button_template() -> Template<ButtonProps> {
        Template::from_parts(
            ["color: ", ";"],
            vec![Insertion::dynamic(|p: &ButtonProps| {
                if p.primary {
                    "blue"
                } else {
                    "gray"
                }
            })],
        )
    }

    #[test]
    fn styled_merges_classes() {
        let runtime = create_runtime();
        let registry = registry();
        let template = button_template();

        let props = ButtonProps {
            class: Some("existing".to_owned()),
            primary: true,
        };
        let class = styled_in(&registry, |p: ButtonProps| p.class, &template, props).unwrap();
        let generated = registry.entry(&transform("color: blue;").unwrap());
        assert_eq!(class, Some(format!("existing {generated}")));

        let props = ButtonProps {
            class: None,
            primary: false,
        };
        let class = styled_in(&registry, |p: ButtonProps| p.class, &template, props).unwrap();
        let generated = registry.entry(&transform("color: gray;").unwrap());
        assert_eq!(class, Some(generated));

        runtime.dispose();
    }

    #[test]
    fn panicking_insertion_leaves_registry_untouched() {
        let runtime = create_runtime();
        let registry = registry();
        let template: Template<ButtonProps> = Template::from_parts(
            ["color: ", ";"],
            vec![Insertion::dynamic(|_: &ButtonProps| -> &'static str {
                panic!("no color for this button")
            })],
        );

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let props = ButtonProps {
                class: None,
                primary: true,
            };
            styled_in(&registry, |p: ButtonProps| p.class, &template, props)
        }));
        assert!(result.is_err());
        assert!(registry.is_empty());
        assert!(registry.with_host(|h| h.attached.borrow().is_empty()));

        runtime.dispose();
    }
}
