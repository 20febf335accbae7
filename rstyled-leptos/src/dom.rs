use rstyled_core::StyleHost;
use web_sys::Element;

/// Browser document host.
/// Each container is a `<style>` element, appended to `document.head` while it is in use.
///
/// Without window or document (e.g. in a web worker) containers are `None` and every operation is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct DomHost;

fn document() -> Option<web_sys::Document> {
    web_sys::window()?.document()
}

impl StyleHost for DomHost {
    type Node = Option<Element>;

    fn create_container(&self) -> Self::Node {
        match document()?.create_element("style") {
            Ok(element) => Some(element),
            Err(e) => {
                log::error!("Failed to create style element: {e:?}");
                None
            }
        }
    }

    fn attach(&self, node: &Self::Node) {
        let Some(node) = node else {
            return;
        };
        let Some(head) = document().and_then(|d| d.head()) else {
            log::warn!("Document has no head, style is not attached");
            return;
        };
        if let Err(e) = head.append_child(node) {
            log::error!("Failed to attach style element: {e:?}");
        }
    }

    fn detach(&self, node: &Self::Node) {
        if let Some(node) = node {
            node.remove();
        }
    }

    fn text_content(&self, node: &Self::Node) -> Option<String> {
        node.as_ref()?.text_content()
    }

    fn set_text_content(&self, node: &Self::Node, text: &str) {
        if let Some(node) = node {
            node.set_text_content(Some(text));
        }
    }
}
