//! Fallback viewer engine.
//!
//! A self-contained overlay used when no gallery library is available. It
//! reproduces the library's observable contract closely enough that the
//! adapter drives it through the same [`Viewer`] trait: one [`Lightbox`] per
//! selector partition, opened by clicking a trigger.
//!
//! ## Lifecycle
//!
//! ```text
//!           click trigger              ArrowLeft / ArrowRight / prev / next
//!   Idle ─────────────────▶ Open ◀──────────────────────────────────┐
//!    ▲                       │  └────────────────────────────────────┘
//!    │   Escape / backdrop   │
//!    └───── / close ◀────────┘   (overlay removed 200 ms later)
//! ```
//!
//! Opening while already open removes the old overlay immediately and builds
//! a new one. A closed overlay still waiting for teardown is removed at the
//! same moment, so two overlays never coexist.
//!
//! ## Rendering
//!
//! Every slide change re-reads the trigger's attributes. The visible image
//! only changes once the off-screen preload for the new source reports back
//! with the matching [`LoadTicket`]; anything older is dropped.

mod overlay;

pub use overlay::Overlay;

use crate::classes;
use crate::dom::{Document, FocusOptions, NodeId, Selector};
use crate::events::{Dispatch, Key, KeyEvent};
use crate::preload::{LoadOutcome, LoadTicket};
use crate::timers::{TEARDOWN_DELAY_MS, Task, TimerId};
use crate::trigger;
use crate::viewer::{Effect, Surface, Viewer, ViewerFactory, ViewerOptions};
use tracing::{debug, warn};

/// Installs [`Lightbox`] viewers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackFactory;

impl ViewerFactory for FallbackFactory {
    fn create(&self, options: ViewerOptions, cx: &mut Surface<'_>) -> Option<Box<dyn Viewer>> {
        let mut lightbox = Lightbox::new(options);
        lightbox.refresh(cx);
        Some(Box::new(lightbox))
    }
}

#[derive(Debug, Clone)]
struct PendingLoad {
    ticket: LoadTicket,
    src: String,
    alt: String,
}

/// One fallback viewer bound to a selector.
#[derive(Debug)]
pub struct Lightbox {
    options: ViewerOptions,
    selector: Option<Selector>,
    /// Triggers with a click handler attached.
    elements: Vec<NodeId>,
    collection: Vec<NodeId>,
    active_index: usize,
    overlay: Option<Overlay>,
    reveal: Option<TimerId>,
    /// Closed overlay root and its teardown timer.
    closing: Option<(NodeId, TimerId)>,
    pending: Option<PendingLoad>,
    keyboard_bound: bool,
}

impl Lightbox {
    pub fn new(options: ViewerOptions) -> Self {
        let selector = match Selector::parse(&options.selector) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!(selector = %options.selector, error = %e, "unusable selector, viewer has no elements");
                None
            }
        };
        Self {
            options,
            selector,
            elements: Vec::new(),
            collection: Vec::new(),
            active_index: 0,
            overlay: None,
            reveal: None,
            closing: None,
            pending: None,
            keyboard_bound: false,
        }
    }

    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    pub fn elements(&self) -> &[NodeId] {
        &self.elements
    }

    pub fn collection(&self) -> &[NodeId] {
        &self.collection
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    /// Open the overlay on `clicked`'s collection. Inert triggers open
    /// nothing.
    pub fn open_from(&mut self, cx: &mut Surface<'_>, clicked: NodeId) {
        if trigger::is_inert(cx.doc, clicked) {
            debug!(?clicked, "trigger has no image source");
            return;
        }
        let (collection, index) = trigger::build_collection(cx.doc, &self.elements, clicked);
        debug!(items = collection.len(), index, "opening overlay");
        self.collection = collection;
        self.active_index = index;
        self.build_overlay(cx);
        self.show_slide(cx, index as isize);
    }

    /// Move to `index`. Out-of-range indices wrap when looping and clamp
    /// otherwise.
    pub fn show_slide(&mut self, cx: &mut Surface<'_>, index: isize) {
        let len = self.collection.len() as isize;
        if len == 0 {
            return;
        }
        let index = if self.options.looping {
            index.rem_euclid(len)
        } else {
            index.clamp(0, len - 1)
        };
        self.active_index = index as usize;
        self.render_item(cx);
        self.update_nav_state(cx.doc);
    }

    pub fn show_previous(&mut self, cx: &mut Surface<'_>) {
        self.show_slide(cx, self.active_index as isize - 1);
    }

    pub fn show_next(&mut self, cx: &mut Surface<'_>) {
        self.show_slide(cx, self.active_index as isize + 1);
    }

    /// Start closing. The overlay loses its active state now and leaves the
    /// document after [`TEARDOWN_DELAY_MS`].
    pub fn close(&mut self, cx: &mut Surface<'_>) {
        let Some(overlay) = self.overlay.take() else {
            return;
        };
        self.keyboard_bound = false;
        self.pending = None;
        if let Some(reveal) = self.reveal.take() {
            cx.timers.cancel(reveal);
        }
        cx.doc.remove_class(overlay.root, classes::ACTIVE);
        let body = cx.doc.body();
        cx.doc.remove_class(body, classes::BODY_OPEN);
        let timer = cx
            .timers
            .schedule(TEARDOWN_DELAY_MS, Task::Teardown(overlay.root));
        self.closing = Some((overlay.root, timer));
        debug!("overlay closing");
    }

    fn build_overlay(&mut self, cx: &mut Surface<'_>) {
        self.discard_overlay(cx);

        let overlay = Overlay::mount(cx.doc, self.initial_effect());
        let body = cx.doc.body();
        cx.doc.add_class(body, classes::BODY_OPEN);
        self.reveal = Some(cx.timers.schedule(0, Task::Reveal(overlay.root)));
        self.keyboard_bound = true;
        cx.doc.focus(
            overlay.close,
            FocusOptions {
                prevent_scroll: true,
            },
        );
        self.overlay = Some(overlay);
    }

    /// Remove the current overlay and any overlay still waiting for
    /// teardown, without transition.
    fn discard_overlay(&mut self, cx: &mut Surface<'_>) {
        if let Some(overlay) = self.overlay.take() {
            cx.doc.remove(overlay.root);
        }
        if let Some(reveal) = self.reveal.take() {
            cx.timers.cancel(reveal);
        }
        if let Some((root, timer)) = self.closing.take()
            && cx.timers.cancel(timer)
        {
            cx.doc.remove(root);
        }
        self.pending = None;
    }

    /// Modifier the overlay is mounted with, before the first slide applies
    /// its own.
    fn initial_effect(&self) -> Effect {
        match self.options.open_effect {
            Some(effect @ (Effect::Fade | Effect::Zoom | Effect::None)) => effect,
            _ => Effect::Zoom,
        }
    }

    fn render_item(&mut self, cx: &mut Surface<'_>) {
        let Some(overlay) = self.overlay else {
            return;
        };
        let Some(&element) = self.collection.get(self.active_index) else {
            return;
        };
        let effect = trigger::requested_animation(cx.doc, element)
            .and_then(Effect::parse)
            .unwrap_or(Effect::Slide);
        overlay.apply_effect(cx.doc, effect);

        let Some(src) = trigger::image_source(cx.doc, element).map(str::to_owned) else {
            debug!(?element, "slide has no image source, nothing rendered");
            // the previous slide's load must not land here
            self.pending = None;
            cx.doc.remove_class(overlay.image, classes::LOADING);
            set_caption_line(cx.doc, overlay.title, "");
            set_caption_line(cx.doc, overlay.description, "");
            return;
        };

        let caption = trigger::caption(cx.doc, element);
        let alt = trigger::accessible_label(cx.doc, element);
        set_caption_line(cx.doc, overlay.title, &caption.title);
        set_caption_line(cx.doc, overlay.description, &caption.description);

        cx.doc.add_class(overlay.image, classes::LOADING);
        let ticket = cx.preload(&src);
        self.pending = Some(PendingLoad { ticket, src, alt });
    }

    fn update_nav_state(&self, doc: &mut Document) {
        let Some(overlay) = self.overlay else {
            return;
        };
        let last = self.collection.len().saturating_sub(1);
        let (prev_disabled, next_disabled) = if self.collection.len() <= 1 {
            (true, true)
        } else if self.options.looping {
            (false, false)
        } else {
            (self.active_index == 0, self.active_index == last)
        };
        doc.set_disabled(overlay.prev, prev_disabled);
        doc.set_disabled(overlay.next, next_disabled);
    }

    /// Move focus to the next enabled control, wrapping at either end.
    fn cycle_focus(&self, doc: &mut Document, backwards: bool) -> Dispatch {
        let Some(overlay) = self.overlay else {
            return Dispatch::Ignored;
        };
        let enabled: Vec<NodeId> = overlay
            .controls()
            .into_iter()
            .filter(|&c| !doc.is_disabled(c))
            .collect();
        if enabled.is_empty() {
            return Dispatch::Ignored;
        }
        let len = enabled.len();
        let current = doc
            .active_element()
            .and_then(|active| enabled.iter().position(|&c| c == active));
        let target = match (current, backwards) {
            (Some(i), false) => (i + 1) % len,
            (Some(i), true) => (i + len - 1) % len,
            (None, false) => 0,
            (None, true) => len - 1,
        };
        doc.focus(enabled[target], FocusOptions::default());
        Dispatch::Consumed
    }

    fn handle_overlay_click(
        &mut self,
        cx: &mut Surface<'_>,
        overlay: Overlay,
        target: NodeId,
    ) -> Dispatch {
        if target == overlay.root {
            self.close(cx);
            return Dispatch::Consumed;
        }
        let controls = overlay.controls();
        let Some(control) = cx.doc.closest(target, |n| controls.contains(&n)) else {
            return Dispatch::Ignored;
        };
        if cx.doc.is_disabled(control) {
            return Dispatch::Ignored;
        }
        if control == overlay.close {
            self.close(cx);
        } else if control == overlay.prev {
            self.show_previous(cx);
        } else {
            self.show_next(cx);
        }
        Dispatch::Consumed
    }
}

impl Viewer for Lightbox {
    fn handle_click(&mut self, cx: &mut Surface<'_>, target: NodeId) -> Dispatch {
        if let Some(overlay) = self.overlay
            && cx.doc.contains(overlay.root, target)
        {
            return self.handle_overlay_click(cx, overlay, target);
        }
        let Some(clicked) = cx.doc.closest(target, |n| self.elements.contains(&n)) else {
            return Dispatch::Ignored;
        };
        self.open_from(cx, clicked);
        Dispatch::Consumed
    }

    fn handle_key(&mut self, cx: &mut Surface<'_>, event: &KeyEvent) -> Dispatch {
        if !self.keyboard_bound || self.overlay.is_none() {
            return Dispatch::Ignored;
        }
        match event.key {
            Key::Escape => self.close(cx),
            Key::ArrowLeft => self.show_previous(cx),
            Key::ArrowRight => self.show_next(cx),
            Key::Tab => return self.cycle_focus(cx.doc, event.shift),
            Key::Other(_) => return Dispatch::Ignored,
        }
        Dispatch::Consumed
    }

    fn finish_preload(
        &mut self,
        cx: &mut Surface<'_>,
        ticket: LoadTicket,
        outcome: LoadOutcome,
    ) -> bool {
        let Some(pending) = self.pending.take_if(|p| p.ticket == ticket) else {
            return false;
        };
        let Some(overlay) = self.overlay else {
            return true;
        };
        match outcome {
            LoadOutcome::Loaded => {
                cx.doc.set_attribute(overlay.image, "src", &pending.src);
                cx.doc.set_attribute(overlay.image, "alt", &pending.alt);
            }
            LoadOutcome::Failed => {
                warn!(src = %pending.src, "image failed to load");
            }
        }
        cx.doc.remove_class(overlay.image, classes::LOADING);
        true
    }

    fn refresh(&mut self, cx: &mut Surface<'_>) {
        self.elements = match &self.selector {
            Some(selector) => cx.doc.select_all(selector),
            None => Vec::new(),
        };
        debug!(selector = %self.options.selector, elements = self.elements.len(), "handlers attached");
    }

    fn destroy(&mut self, cx: &mut Surface<'_>) {
        self.close(cx);
        self.elements.clear();
        self.collection.clear();
    }

    fn is_open(&self) -> bool {
        self.overlay.is_some()
    }
}

fn set_caption_line(doc: &mut Document, node: NodeId, text: &str) {
    doc.set_text(node, text);
    doc.set_hidden(node, text.is_empty());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn lightbox(rig: &mut Rig, selector: &str, looping: bool) -> Lightbox {
        let mut options = ViewerOptions::new(selector);
        options.looping = looping;
        let mut lightbox = Lightbox::new(options);
        lightbox.refresh(&mut rig.surface());
        lightbox
    }

    fn open_gallery(rig: &mut Rig, count: usize, looping: bool) -> (Lightbox, Vec<NodeId>) {
        let triggers: Vec<NodeId> = (0..count)
            .map(|i| add_trigger(&mut rig.doc, &format!("/img/{i}.jpg"), Some("g")))
            .collect();
        let mut lb = lightbox(rig, ".glightbox", looping);
        lb.handle_click(&mut rig.surface(), triggers[0]);
        (lb, triggers)
    }

    // =========================================================================
    // Opening
    // =========================================================================

    #[test]
    fn click_opens_overlay_and_focuses_close() {
        let mut rig = Rig::new();
        let (lb, _) = open_gallery(&mut rig, 2, false);

        let overlay = *lb.overlay().unwrap();
        assert!(rig.doc.is_connected(overlay.root));
        assert!(rig.doc.has_class(rig.doc.body(), classes::BODY_OPEN));
        assert_eq!(rig.doc.active_element(), Some(overlay.close));
        assert_eq!(
            rig.doc.last_focus_options(),
            Some(FocusOptions {
                prevent_scroll: true
            })
        );
        // active class waits for the reveal tick
        assert!(!rig.doc.has_class(overlay.root, classes::ACTIVE));
        assert_eq!(rig.timers.next_deadline(), Some(0));
    }

    #[test]
    fn click_on_nested_image_finds_trigger() {
        let mut rig = Rig::new();
        let a = add_trigger(&mut rig.doc, "/a.jpg", None);
        let img = rig.doc.create_element("img");
        rig.doc.append_child(a, img);
        let mut lb = lightbox(&mut rig, ".glightbox", false);

        let dispatch = lb.handle_click(&mut rig.surface(), img);
        assert!(dispatch.is_consumed());
        assert!(lb.is_open());
    }

    #[test]
    fn inert_trigger_consumes_click_without_opening() {
        let mut rig = Rig::new();
        let a = add_trigger(&mut rig.doc, "", None);
        let mut lb = lightbox(&mut rig, ".glightbox", false);

        let dispatch = lb.handle_click(&mut rig.surface(), a);
        assert!(dispatch.is_consumed());
        assert!(!lb.is_open());
        assert!(rig.loader.requests().is_empty());
    }

    #[test]
    fn click_outside_elements_is_ignored() {
        let mut rig = Rig::new();
        add_trigger(&mut rig.doc, "/a.jpg", None);
        let stray = rig.doc.create_element("p");
        let body = rig.doc.body();
        rig.doc.append_child(body, stray);
        let mut lb = lightbox(&mut rig, ".glightbox", false);

        assert_eq!(lb.handle_click(&mut rig.surface(), stray), Dispatch::Ignored);
    }

    #[test]
    fn initial_effect_follows_open_effect() {
        let mut rig = Rig::new();
        let a = add_trigger(&mut rig.doc, "/a.jpg", None);
        let mut options = ViewerOptions::new(".glightbox");
        options.open_effect = Some(Effect::Fade);
        let mut lb = Lightbox::new(options);
        assert_eq!(lb.initial_effect(), Effect::Fade);

        lb.options.open_effect = Some(Effect::Slide);
        assert_eq!(lb.initial_effect(), Effect::Zoom);
        lb.options.open_effect = None;
        assert_eq!(lb.initial_effect(), Effect::Zoom);

        lb.refresh(&mut rig.surface());
        lb.handle_click(&mut rig.surface(), a);
        // the slide's own animation replaces the mount-time modifier
        let root = lb.overlay().unwrap().root;
        assert!(rig.doc.has_class(root, "andw-glightbox-effect-slide"));
        assert!(!rig.doc.has_class(root, "andw-glightbox-effect-zoom"));
    }

    #[test]
    fn reopening_replaces_overlay() {
        let mut rig = Rig::new();
        let (mut lb, triggers) = open_gallery(&mut rig, 2, false);
        let first = lb.overlay().unwrap().root;

        lb.open_from(&mut rig.surface(), triggers[1]);
        let second = lb.overlay().unwrap().root;
        assert_ne!(first, second);
        assert!(!rig.doc.is_connected(first));
        assert_eq!(overlay_roots(&rig.doc).len(), 1);
    }

    #[test]
    fn reopening_during_teardown_removes_closing_overlay() {
        let mut rig = Rig::new();
        let (mut lb, triggers) = open_gallery(&mut rig, 1, false);
        let first = lb.overlay().unwrap().root;
        lb.close(&mut rig.surface());
        assert!(rig.doc.is_connected(first));

        lb.handle_click(&mut rig.surface(), triggers[0]);
        assert!(!rig.doc.is_connected(first));
        assert_eq!(overlay_roots(&rig.doc).len(), 1);
    }

    #[test]
    fn malformed_selector_has_no_elements() {
        let mut rig = Rig::new();
        add_trigger(&mut rig.doc, "/a.jpg", None);
        let lb = lightbox(&mut rig, ".glightbox[", false);
        assert!(lb.elements().is_empty());
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    #[test]
    fn show_slide_clamps_without_loop() {
        let mut rig = Rig::new();
        let (mut lb, _) = open_gallery(&mut rig, 3, false);

        lb.show_slide(&mut rig.surface(), -1);
        assert_eq!(lb.active_index(), 0);
        lb.show_slide(&mut rig.surface(), 3);
        assert_eq!(lb.active_index(), 2);
    }

    #[test]
    fn show_slide_wraps_with_loop() {
        let mut rig = Rig::new();
        let (mut lb, _) = open_gallery(&mut rig, 3, true);

        lb.show_slide(&mut rig.surface(), -1);
        assert_eq!(lb.active_index(), 2);
        lb.show_slide(&mut rig.surface(), 3);
        assert_eq!(lb.active_index(), 0);
    }

    #[test]
    fn nav_state_disables_at_ends() {
        let mut rig = Rig::new();
        let (mut lb, _) = open_gallery(&mut rig, 3, false);
        let overlay = *lb.overlay().unwrap();

        assert!(rig.doc.is_disabled(overlay.prev));
        assert!(!rig.doc.is_disabled(overlay.next));

        lb.show_slide(&mut rig.surface(), 2);
        assert!(!rig.doc.is_disabled(overlay.prev));
        assert!(rig.doc.is_disabled(overlay.next));
    }

    #[test]
    fn nav_state_single_item_disables_both() {
        let mut rig = Rig::new();
        let (lb, _) = open_gallery(&mut rig, 1, true);
        let overlay = *lb.overlay().unwrap();
        assert!(rig.doc.is_disabled(overlay.prev));
        assert!(rig.doc.is_disabled(overlay.next));
    }

    #[test]
    fn nav_state_looping_enables_both() {
        let mut rig = Rig::new();
        let (lb, _) = open_gallery(&mut rig, 2, true);
        let overlay = *lb.overlay().unwrap();
        assert!(!rig.doc.is_disabled(overlay.prev));
        assert!(!rig.doc.is_disabled(overlay.next));
    }

    #[test]
    fn control_clicks_navigate_and_close() {
        let mut rig = Rig::new();
        let (mut lb, _) = open_gallery(&mut rig, 3, false);
        let overlay = *lb.overlay().unwrap();

        let icon = rig.doc.children(overlay.next)[0];
        assert!(lb.handle_click(&mut rig.surface(), icon).is_consumed());
        assert_eq!(lb.active_index(), 1);

        lb.handle_click(&mut rig.surface(), overlay.prev);
        assert_eq!(lb.active_index(), 0);

        lb.handle_click(&mut rig.surface(), overlay.close);
        assert!(!lb.is_open());
    }

    #[test]
    fn disabled_control_click_is_ignored() {
        let mut rig = Rig::new();
        let (mut lb, _) = open_gallery(&mut rig, 2, false);
        let overlay = *lb.overlay().unwrap();

        let dispatch = lb.handle_click(&mut rig.surface(), overlay.prev);
        assert_eq!(dispatch, Dispatch::Ignored);
        assert_eq!(lb.active_index(), 0);
    }

    #[test]
    fn backdrop_click_closes_but_stage_click_does_not() {
        let mut rig = Rig::new();
        let (mut lb, _) = open_gallery(&mut rig, 1, false);
        let overlay = *lb.overlay().unwrap();

        assert_eq!(lb.handle_click(&mut rig.surface(), overlay.stage), Dispatch::Ignored);
        assert!(lb.is_open());

        lb.handle_click(&mut rig.surface(), overlay.root);
        assert!(!lb.is_open());
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    #[test]
    fn render_waits_for_preload() {
        let mut rig = Rig::new();
        let a = add_trigger(&mut rig.doc, "/a.jpg", None);
        rig.doc.set_attribute(a, "aria-label", "Harbour");
        let mut lb = lightbox(&mut rig, ".glightbox", false);
        lb.handle_click(&mut rig.surface(), a);
        let image = lb.overlay().unwrap().image;

        assert!(rig.doc.has_class(image, classes::LOADING));
        assert_eq!(rig.doc.attribute(image, "src"), None);

        let request = rig.loader.take_requests().remove(0);
        assert_eq!(request.src, "/a.jpg");
        assert!(lb.finish_preload(&mut rig.surface(), request.ticket, LoadOutcome::Loaded));
        assert_eq!(rig.doc.attribute(image, "src"), Some("/a.jpg"));
        assert_eq!(rig.doc.attribute(image, "alt"), Some("Harbour"));
        assert!(!rig.doc.has_class(image, classes::LOADING));
    }

    #[test]
    fn failed_preload_only_clears_loading() {
        let mut rig = Rig::new();
        let (mut lb, _) = open_gallery(&mut rig, 1, false);
        let image = lb.overlay().unwrap().image;
        let request = rig.loader.take_requests().remove(0);

        lb.finish_preload(&mut rig.surface(), request.ticket, LoadOutcome::Failed);
        assert_eq!(rig.doc.attribute(image, "src"), None);
        assert!(!rig.doc.has_class(image, classes::LOADING));
        assert!(lb.is_open());
    }

    #[test]
    fn stale_preload_is_discarded() {
        let mut rig = Rig::new();
        let (mut lb, _) = open_gallery(&mut rig, 2, false);
        lb.show_next(&mut rig.surface());
        let image = lb.overlay().unwrap().image;
        let requests = rig.loader.take_requests();
        assert_eq!(requests.len(), 2);

        assert!(!lb.finish_preload(&mut rig.surface(), requests[0].ticket, LoadOutcome::Loaded));
        assert_eq!(rig.doc.attribute(image, "src"), None);
        assert!(rig.doc.has_class(image, classes::LOADING));

        lb.finish_preload(&mut rig.surface(), requests[1].ticket, LoadOutcome::Loaded);
        assert_eq!(rig.doc.attribute(image, "src"), Some("/img/1.jpg"));
    }

    #[test]
    fn empty_source_renders_nothing() {
        let mut rig = Rig::new();
        let (mut lb, triggers) = open_gallery(&mut rig, 2, false);
        let image = lb.overlay().unwrap().image;
        let request = rig.loader.take_requests().remove(0);
        lb.finish_preload(&mut rig.surface(), request.ticket, LoadOutcome::Loaded);

        rig.doc.set_attribute(triggers[1], "href", "");
        lb.show_next(&mut rig.surface());
        assert!(rig.loader.requests().is_empty());
        assert_eq!(rig.doc.attribute(image, "src"), Some("/img/0.jpg"));
    }

    #[test]
    fn earlier_load_does_not_land_on_slide_without_source() {
        let mut rig = Rig::new();
        let a = add_trigger(&mut rig.doc, "/a.jpg", Some("g"));
        rig.doc.set_attribute(a, "data-title", "A");
        let b = add_trigger(&mut rig.doc, "/b.jpg", Some("g"));
        rig.doc.set_attribute(b, "data-title", "B");
        rig.doc.set_attribute(b, "data-andw-animation", "fade");
        let mut lb = lightbox(&mut rig, ".glightbox", false);
        lb.handle_click(&mut rig.surface(), a);
        let overlay = *lb.overlay().unwrap();
        let first = rig.loader.take_requests().remove(0);

        rig.doc.remove_attribute(b, "href");
        lb.show_next(&mut rig.surface());
        assert_eq!(lb.active_index(), 1);
        assert!(!rig.doc.has_class(overlay.image, classes::LOADING));
        assert!(rig.doc.is_hidden(overlay.title));
        assert_eq!(rig.doc.text(overlay.title), "");
        assert!(rig.doc.has_class(overlay.root, &classes::effect_class(Effect::Fade)));

        assert!(!lb.finish_preload(&mut rig.surface(), first.ticket, LoadOutcome::Loaded));
        assert_eq!(rig.doc.attribute(overlay.image, "src"), None);
        assert_eq!(rig.doc.attribute(overlay.image, "alt"), Some(""));
    }

    #[test]
    fn captions_hide_when_empty() {
        let mut rig = Rig::new();
        let a = add_trigger(&mut rig.doc, "/a.jpg", Some("g"));
        rig.doc.set_attribute(a, "data-title", "Dusk");
        let b = add_trigger(&mut rig.doc, "/b.jpg", Some("g"));
        rig.doc.set_attribute(b, "data-description", "Harbour");
        let mut lb = lightbox(&mut rig, ".glightbox", false);
        lb.handle_click(&mut rig.surface(), a);
        let overlay = *lb.overlay().unwrap();

        assert_eq!(rig.doc.text(overlay.title), "Dusk");
        assert!(!rig.doc.is_hidden(overlay.title));
        assert!(rig.doc.is_hidden(overlay.description));

        lb.show_next(&mut rig.surface());
        assert_eq!(rig.doc.text(overlay.title), "");
        assert!(rig.doc.is_hidden(overlay.title));
        assert_eq!(rig.doc.text(overlay.description), "Harbour");
    }

    #[test]
    fn slide_animation_sets_effect_modifier() {
        let mut rig = Rig::new();
        let a = add_trigger(&mut rig.doc, "/a.jpg", Some("g"));
        rig.doc.set_attribute(a, "data-andw-animation", "fade");
        let b = add_trigger(&mut rig.doc, "/b.jpg", Some("g"));
        rig.doc.set_attribute(b, "data-andw-animation", "bogus");
        let mut lb = lightbox(&mut rig, ".glightbox", false);
        lb.handle_click(&mut rig.surface(), a);
        let root = lb.overlay().unwrap().root;
        assert!(rig.doc.has_class(root, "andw-glightbox-effect-fade"));

        lb.show_next(&mut rig.surface());
        assert!(rig.doc.has_class(root, "andw-glightbox-effect-slide"));
        assert!(!rig.doc.has_class(root, "andw-glightbox-effect-fade"));
    }

    // =========================================================================
    // Keyboard and closing
    // =========================================================================

    #[test]
    fn arrows_navigate_and_escape_closes() {
        let mut rig = Rig::new();
        let (mut lb, _) = open_gallery(&mut rig, 3, false);

        lb.handle_key(&mut rig.surface(), &KeyEvent::new(Key::ArrowRight));
        lb.handle_key(&mut rig.surface(), &KeyEvent::new(Key::ArrowRight));
        assert_eq!(lb.active_index(), 2);
        lb.handle_key(&mut rig.surface(), &KeyEvent::new(Key::ArrowLeft));
        assert_eq!(lb.active_index(), 1);

        let dispatch = lb.handle_key(&mut rig.surface(), &KeyEvent::new(Key::Escape));
        assert!(dispatch.is_consumed());
        assert!(!lb.is_open());
    }

    #[test]
    fn keys_are_ignored_when_closed() {
        let mut rig = Rig::new();
        let mut lb = lightbox(&mut rig, ".glightbox", false);
        let dispatch = lb.handle_key(&mut rig.surface(), &KeyEvent::new(Key::Escape));
        assert_eq!(dispatch, Dispatch::Ignored);
    }

    #[test]
    fn tab_wraps_from_next_to_close() {
        let mut rig = Rig::new();
        let (mut lb, _) = open_gallery(&mut rig, 3, true);
        let overlay = *lb.overlay().unwrap();
        rig.doc.focus(overlay.next, FocusOptions::default());

        let dispatch = lb.handle_key(&mut rig.surface(), &KeyEvent::new(Key::Tab));
        assert!(dispatch.is_consumed());
        assert_eq!(rig.doc.active_element(), Some(overlay.close));
    }

    #[test]
    fn shift_tab_wraps_from_close_to_last_enabled() {
        let mut rig = Rig::new();
        let (mut lb, _) = open_gallery(&mut rig, 3, false);
        let overlay = *lb.overlay().unwrap();
        // first slide: prev is disabled, so the cycle is close <-> next
        lb.handle_key(&mut rig.surface(), &KeyEvent::shifted(Key::Tab));
        assert_eq!(rig.doc.active_element(), Some(overlay.next));
        lb.handle_key(&mut rig.surface(), &KeyEvent::new(Key::Tab));
        assert_eq!(rig.doc.active_element(), Some(overlay.close));
    }

    #[test]
    fn close_unbinds_immediately_and_schedules_teardown() {
        let mut rig = Rig::new();
        let (mut lb, _) = open_gallery(&mut rig, 1, false);
        let root = lb.overlay().unwrap().root;
        rig.doc.add_class(root, classes::ACTIVE);

        lb.close(&mut rig.surface());
        assert!(!rig.doc.has_class(root, classes::ACTIVE));
        assert!(!rig.doc.has_class(rig.doc.body(), classes::BODY_OPEN));
        assert!(rig.doc.is_connected(root));
        assert_eq!(rig.timers.next_deadline(), Some(TEARDOWN_DELAY_MS));
        assert_eq!(
            rig.timers.pop_due(TEARDOWN_DELAY_MS),
            Some(Task::Teardown(root))
        );
        assert_eq!(
            lb.handle_key(&mut rig.surface(), &KeyEvent::new(Key::ArrowRight)),
            Dispatch::Ignored
        );
    }

    #[test]
    fn destroy_without_elements_is_safe() {
        let mut rig = Rig::new();
        let mut lb = lightbox(&mut rig, ".glightbox", false);
        lb.destroy(&mut rig.surface());
        assert!(!lb.is_open());
        assert_eq!(rig.timers.pending(), 0);
    }

    #[test]
    fn destroy_closes_and_detaches() {
        let mut rig = Rig::new();
        let (mut lb, triggers) = open_gallery(&mut rig, 2, false);
        lb.destroy(&mut rig.surface());
        assert!(!lb.is_open());
        assert_eq!(lb.handle_click(&mut rig.surface(), triggers[0]), Dispatch::Ignored);
    }

    #[test]
    fn factory_refreshes_on_create() {
        let mut rig = Rig::new();
        add_trigger(&mut rig.doc, "/a.jpg", None);
        let viewer = FallbackFactory
            .create(ViewerOptions::new(".glightbox"), &mut rig.surface())
            .unwrap();
        assert!(!viewer.is_open());
    }
}
