//! Overlay construction.
//!
//! The subtree is built detached and attached to `<body>` in one append, so
//! a mutation observer sees a single added node: the backdrop.

use crate::classes;
use crate::dom::{Document, NodeId};
use crate::viewer::Effect;

/// Node handles of one mounted overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlay {
    pub root: NodeId,
    pub stage: NodeId,
    pub image: NodeId,
    pub title: NodeId,
    pub description: NodeId,
    pub close: NodeId,
    pub prev: NodeId,
    pub next: NodeId,
}

impl Overlay {
    /// Build the overlay with `effect` as its initial modifier and append it
    /// to the body.
    pub fn mount(doc: &mut Document, effect: Effect) -> Self {
        let root = element(doc, "div", classes::BACKDROP);
        doc.add_class(root, &classes::effect_class(effect));

        let stage = element(doc, "div", classes::STAGE);
        let figure = doc.create_element("figure");
        let image = element(doc, "img", classes::IMAGE);
        doc.set_attribute(image, "alt", "");
        let caption = element(doc, "div", classes::CAPTION);
        let title = element(doc, "h2", classes::TITLE);
        let description = element(doc, "p", classes::DESCRIPTION);

        doc.append_child(caption, title);
        doc.append_child(caption, description);
        doc.append_child(figure, image);
        doc.append_child(figure, caption);
        doc.append_child(stage, figure);

        let close = button(doc, classes::CLOSE, "×", "Close");
        let prev = button(doc, classes::PREV, "‹", "Previous");
        let next = button(doc, classes::NEXT, "›", "Next");
        doc.append_child(stage, close);
        doc.append_child(stage, prev);
        doc.append_child(stage, next);

        doc.append_child(root, stage);
        let body = doc.body();
        doc.append_child(body, root);

        Self {
            root,
            stage,
            image,
            title,
            description,
            close,
            prev,
            next,
        }
    }

    /// Focusable controls in tab order.
    pub fn controls(&self) -> [NodeId; 3] {
        [self.close, self.prev, self.next]
    }

    /// Swap the effect modifier on the backdrop for `effect`.
    pub fn apply_effect(&self, doc: &mut Document, effect: Effect) {
        for other in Effect::ALL {
            doc.remove_class(self.root, &classes::effect_class(other));
        }
        doc.add_class(self.root, &classes::effect_class(effect));
    }
}

fn element(doc: &mut Document, tag: &str, class: &str) -> NodeId {
    let node = doc.create_element(tag);
    doc.add_class(node, class);
    node
}

fn button(doc: &mut Document, class: &str, glyph: &str, label: &str) -> NodeId {
    let node = element(doc, "button", class);
    doc.set_attribute(node, "type", "button");
    doc.set_attribute(node, "aria-label", label);
    let icon = element(doc, "span", classes::ICON);
    doc.set_text(icon, glyph);
    doc.append_child(node, icon);
    node
}
