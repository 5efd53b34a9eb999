//! Shared test utilities for the lightbox test suite.
//!
//! Provides a bare event surface for driving a single viewer, trigger
//! builders, and lookups that panic with a clear message on miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut rig = Rig::new();
//! let a = add_trigger(&mut rig.doc, "/a.jpg", Some("g"));
//! let mut lightbox = Lightbox::new(ViewerOptions::new(".glightbox"));
//! lightbox.refresh(&mut rig.surface());
//! lightbox.handle_click(&mut rig.surface(), a);
//! assert_eq!(overlay_roots(&rig.doc).len(), 1);
//! ```

use crate::classes;
use crate::dom::{Document, NodeId};
use crate::page::Page;
use crate::preload::{LoadRequest, QueuedLoader};
use crate::timers::Timers;
use crate::viewer::Surface;

// =========================================================================
// Event surface
// =========================================================================

/// Everything a viewer needs for one event, without a page around it.
#[derive(Debug, Default)]
pub struct Rig {
    pub doc: Document,
    pub timers: Timers,
    pub loader: QueuedLoader,
    next_ticket: u64,
}

impl Rig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surface(&mut self) -> Surface<'_> {
        Surface::new(
            &mut self.doc,
            &mut self.timers,
            &mut self.loader,
            &mut self.next_ticket,
        )
    }
}

// =========================================================================
// Builders
// =========================================================================

/// Append a `.glightbox` anchor to the body.
pub fn add_trigger(doc: &mut Document, href: &str, gallery: Option<&str>) -> NodeId {
    let a = doc.create_element("a");
    doc.add_class(a, classes::TRIGGER);
    doc.set_attribute(a, "href", href);
    if let Some(gallery) = gallery {
        doc.set_attribute(a, "data-gallery", gallery);
    }
    let body = doc.body();
    doc.append_child(body, a);
    a
}

/// Like [`add_trigger`], with a `data-andw-animation` value.
pub fn add_animated_trigger(
    doc: &mut Document,
    href: &str,
    gallery: Option<&str>,
    animation: &str,
) -> NodeId {
    let a = add_trigger(doc, href, gallery);
    doc.set_attribute(a, "data-andw-animation", animation);
    a
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Connected overlay roots, in document order.
pub fn overlay_roots(doc: &Document) -> Vec<NodeId> {
    doc.query_selector_all(&format!(".{}", classes::BACKDROP))
        .unwrap()
}

/// The only connected overlay. Panics unless exactly one exists.
pub fn sole_overlay(doc: &Document) -> NodeId {
    let roots = overlay_roots(doc);
    assert_eq!(roots.len(), 1, "expected one overlay, found {roots:?}");
    roots[0]
}

/// First element with `class` inside `scope`. Panics if not found.
pub fn find_in(doc: &Document, scope: NodeId, class: &str) -> NodeId {
    doc.descendants(scope)
        .into_iter()
        .find(|&n| doc.has_class(n, class))
        .unwrap_or_else(|| panic!("no .{class} under {scope:?}"))
}

/// The single outstanding preload request for `src`. Panics if not found.
pub fn request_for(page: &Page, src: &str) -> LoadRequest {
    page.loader()
        .requests()
        .iter()
        .rev()
        .find(|r| r.src == src)
        .cloned()
        .unwrap_or_else(|| {
            let srcs: Vec<&str> = page.loader().requests().iter().map(|r| r.src.as_str()).collect();
            panic!("no preload for '{src}'. Requested: {srcs:?}")
        })
}
