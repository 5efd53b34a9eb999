//! Reading trigger elements.
//!
//! A trigger is an anchor the server-side rewriter produced around an image.
//! Everything the lightbox knows about an item comes from the anchor's
//! attributes, read fresh at open time:
//!
//! | Attribute | Meaning |
//! |---|---|
//! | `href` / `data-href` | enlarged image URL (first non-empty wins) |
//! | `data-gallery` | group id; absent or empty = standalone |
//! | `data-andw-animation` | `slide`, `fade`, `zoom`, `none` |
//! | `data-title`, `data-description` | caption text |
//! | `aria-label` | accessible name, precomputed from title and alt |
//!
//! A trigger with no usable URL is inert: it never opens and never joins a
//! collection.

use crate::classes;
use crate::dom::{Document, NodeId};

pub const ATTR_HREF: &str = "href";
pub const ATTR_DATA_HREF: &str = "data-href";
pub const ATTR_GALLERY: &str = "data-gallery";
pub const ATTR_ANIMATION: &str = "data-andw-animation";
pub const ATTR_TITLE: &str = "data-title";
pub const ATTR_DESCRIPTION: &str = "data-description";
pub const ATTR_ARIA_LABEL: &str = "aria-label";

/// Selector for every trigger on the page, regardless of effect.
pub fn trigger_selector() -> String {
    format!(".{}", classes::TRIGGER)
}

fn non_empty<'a>(doc: &'a Document, node: NodeId, name: &str) -> Option<&'a str> {
    doc.attribute(node, name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Enlarged image URL: `href`, else `data-href`. `None` when both are
/// missing or blank.
pub fn image_source(doc: &Document, node: NodeId) -> Option<&str> {
    non_empty(doc, node, ATTR_HREF).or_else(|| non_empty(doc, node, ATTR_DATA_HREF))
}

pub fn is_inert(doc: &Document, node: NodeId) -> bool {
    image_source(doc, node).is_none()
}

/// Gallery group id, if the trigger belongs to one.
pub fn gallery(doc: &Document, node: NodeId) -> Option<&str> {
    non_empty(doc, node, ATTR_GALLERY)
}

/// Raw `data-andw-animation` value, unvalidated.
pub fn requested_animation(doc: &Document, node: NodeId) -> Option<&str> {
    doc.attribute(node, ATTR_ANIMATION)
}

/// Caption text shown under the image. Empty strings mean "hide".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caption {
    pub title: String,
    pub description: String,
}

pub fn caption(doc: &Document, node: NodeId) -> Caption {
    Caption {
        title: non_empty(doc, node, ATTR_TITLE).unwrap_or_default().to_string(),
        description: non_empty(doc, node, ATTR_DESCRIPTION)
            .unwrap_or_default()
            .to_string(),
    }
}

/// Combine a title and an alt text into one readable label.
///
/// Non-empty parts are joined with `" / "`; the alt is skipped when it
/// repeats the title.
///
/// - `("Dusk", "Harbour at dusk")` → `"Dusk / Harbour at dusk"`
/// - `("Dusk", "Dusk")` → `"Dusk"`
/// - `("", "Harbour")` → `"Harbour"`
pub fn aria_label(title: &str, alt: &str) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(2);
    let title = title.trim();
    let alt = alt.trim();
    if !title.is_empty() {
        parts.push(title);
    }
    if !alt.is_empty() && !parts.contains(&alt) {
        parts.push(alt);
    }
    parts.join(" / ")
}

/// Text for the overlay image's `alt`: the trigger's own `aria-label`,
/// else its title combined with the alt of the wrapped `<img>`.
pub fn accessible_label(doc: &Document, node: NodeId) -> String {
    if let Some(label) = non_empty(doc, node, ATTR_ARIA_LABEL) {
        return label.to_string();
    }
    let title = non_empty(doc, node, ATTR_TITLE).unwrap_or_default();
    let alt = doc
        .descendants(node)
        .into_iter()
        .find(|&n| doc.tag(n) == "img")
        .and_then(|img| doc.attribute(img, "alt"))
        .unwrap_or_default();
    aria_label(title, alt)
}

/// The collection a click on `trigger` opens, and the trigger's index in it.
///
/// With a gallery id, the collection is every non-inert element of
/// `attached` sharing that id, in the order given (document order). Without
/// one, or when nothing matches, it is just `trigger`. The index falls back
/// to 0 when the trigger itself is not in the collection.
pub fn build_collection(
    doc: &Document,
    attached: &[NodeId],
    trigger: NodeId,
) -> (Vec<NodeId>, usize) {
    let mut collection = match gallery(doc, trigger) {
        Some(group) => attached
            .iter()
            .copied()
            .filter(|&el| gallery(doc, el) == Some(group) && !is_inert(doc, el))
            .collect(),
        None => vec![trigger],
    };
    if collection.is_empty() {
        collection.push(trigger);
    }
    let index = collection.iter().position(|&el| el == trigger).unwrap_or(0);
    (collection, index)
}
