//! Primary viewer adapter.
//!
//! Finds trigger elements, splits them into one partition per transition
//! effect, and asks the installed [`ViewerFactory`] for one viewer per
//! non-empty partition. It does not care whether the factory is a gallery
//! library bridge or the [fallback engine](crate::engine).
//!
//! | Partition | Selector |
//! |---|---|
//! | `default` | `.glightbox:not([data-andw-animation])` |
//! | `fade` | `.glightbox[data-andw-animation="fade"]` |
//! | `zoom` | `.glightbox[data-andw-animation="zoom"]` |
//! | `slide` | `.glightbox[data-andw-animation="slide"]` |
//! | `none` | `.glightbox[data-andw-animation="none"]` |
//!
//! With the `observer` setting on, added content schedules a debounced
//! re-init: every addition restarts a [`REINIT_DEBOUNCE_MS`] quiet window.
//! The overlay's own mount is not "added content" and is filtered out.

use crate::classes;
use crate::config::{LightboxSettings, resolve_effect};
use crate::dom::{Document, MutationRecord, NodeId};
use crate::events::{Dispatch, KeyEvent};
use crate::preload::{LoadOutcome, LoadTicket};
use crate::timers::{REINIT_DEBOUNCE_MS, Task, TimerId};
use crate::trigger::{self, ATTR_ANIMATION};
use crate::viewer::{Effect, Surface, Viewer, ViewerFactory, ViewerOptions};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// A selector partition: triggers without an animation attribute, or
/// triggers requesting one specific effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Default,
    Effect(Effect),
}

/// Partitions in instantiation order.
pub const PARTITIONS: [Partition; 5] = [
    Partition::Default,
    Partition::Effect(Effect::Fade),
    Partition::Effect(Effect::Zoom),
    Partition::Effect(Effect::Slide),
    Partition::Effect(Effect::None),
];

impl Partition {
    pub fn name(self) -> &'static str {
        match self {
            Partition::Default => "default",
            Partition::Effect(effect) => effect.as_str(),
        }
    }

    pub fn selector(self) -> String {
        match self {
            Partition::Default => format!(".{}:not([{ATTR_ANIMATION}])", classes::TRIGGER),
            Partition::Effect(effect) => {
                format!(".{}[{ATTR_ANIMATION}=\"{effect}\"]", classes::TRIGGER)
            }
        }
    }

    /// Viewer options for this partition. An effect of `none` also turns
    /// off the open and close transitions.
    pub fn options(self, settings: &LightboxSettings) -> ViewerOptions {
        let effect = resolve_effect(Some(self.name()), settings);
        let mut options = ViewerOptions::new(self.selector());
        options.slide_effect = effect;
        if effect == Effect::None {
            options.open_effect = Some(Effect::None);
            options.close_effect = Some(Effect::None);
        }
        options
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tracks the viewers created by the most recent [`Adapter::init`].
pub struct Adapter {
    settings: LightboxSettings,
    instances: Vec<(Partition, Box<dyn Viewer>)>,
    refresh_timer: Option<TimerId>,
    init_count: u64,
}

impl Adapter {
    pub fn new(settings: LightboxSettings) -> Self {
        Self {
            settings: settings.normalized(),
            instances: Vec::new(),
            refresh_timer: None,
            init_count: 0,
        }
    }

    pub fn settings(&self) -> &LightboxSettings {
        &self.settings
    }

    /// Partitions that currently have a viewer, in creation order.
    pub fn partitions(&self) -> Vec<Partition> {
        self.instances.iter().map(|(p, _)| *p).collect()
    }

    /// How many times [`Adapter::init`] has run.
    pub fn init_count(&self) -> u64 {
        self.init_count
    }

    pub fn is_refresh_pending(&self) -> bool {
        self.refresh_timer.is_some()
    }

    pub fn is_open(&self) -> bool {
        self.instances.iter().any(|(_, v)| v.is_open())
    }

    /// Destroy every tracked viewer and rebuild from the current document.
    pub fn init(&mut self, cx: &mut Surface<'_>, factory: Option<Rc<dyn ViewerFactory>>) {
        self.init_count += 1;
        self.destroy_instances(cx);

        let any = cx
            .doc
            .query_selector(&trigger::trigger_selector())
            .ok()
            .flatten();
        if any.is_none() {
            debug!("no lightbox triggers on page");
            return;
        }
        let Some(factory) = factory else {
            warn!("no viewer library available, lightbox not initialized");
            return;
        };

        for partition in PARTITIONS {
            let selector = partition.selector();
            if cx.doc.query_selector(&selector).ok().flatten().is_none() {
                continue;
            }
            let options = partition.options(&self.settings);
            let effect = options.slide_effect;
            match factory.create(options, cx) {
                Some(viewer) => {
                    debug!(%partition, %effect, "viewer created");
                    self.instances.push((partition, viewer));
                }
                None => warn!(%partition, "viewer factory returned no instance"),
            }
        }
        info!(viewers = self.instances.len(), "lightbox initialized");
    }

    /// Run the init queued by [`Adapter::observe`].
    pub fn run_scheduled_init(
        &mut self,
        cx: &mut Surface<'_>,
        factory: Option<Rc<dyn ViewerFactory>>,
    ) {
        self.refresh_timer = None;
        self.init(cx, factory);
    }

    /// Feed a batch of child-list mutations. Any node added under the body,
    /// other than an overlay, restarts the re-init debounce.
    pub fn observe(&mut self, cx: &mut Surface<'_>, records: &[MutationRecord]) {
        if !self.settings.observer {
            return;
        }
        let doc = &*cx.doc;
        let body = doc.body();
        let content_added = records.iter().any(|record| {
            doc.contains(body, record.target)
                && record
                    .added_nodes
                    .iter()
                    .any(|&node| !is_overlay_node(doc, node))
        });
        if !content_added {
            return;
        }
        if let Some(timer) = self.refresh_timer.take() {
            cx.timers.cancel(timer);
        }
        self.refresh_timer = Some(cx.timers.schedule(REINIT_DEBOUNCE_MS, Task::Reinit));
        debug!(delay_ms = REINIT_DEBOUNCE_MS, "re-init scheduled");
    }

    pub fn click(&mut self, cx: &mut Surface<'_>, target: NodeId) -> Dispatch {
        for (_, viewer) in &mut self.instances {
            if viewer.handle_click(cx, target).is_consumed() {
                return Dispatch::Consumed;
            }
        }
        Dispatch::Ignored
    }

    /// Every viewer sees the key; it counts as consumed if any of them acted.
    pub fn key(&mut self, cx: &mut Surface<'_>, event: &KeyEvent) -> Dispatch {
        let mut dispatch = Dispatch::Ignored;
        for (_, viewer) in &mut self.instances {
            if viewer.handle_key(cx, event).is_consumed() {
                dispatch = Dispatch::Consumed;
            }
        }
        dispatch
    }

    pub fn finish_preload(
        &mut self,
        cx: &mut Surface<'_>,
        ticket: LoadTicket,
        outcome: LoadOutcome,
    ) -> bool {
        self.instances
            .iter_mut()
            .any(|(_, viewer)| viewer.finish_preload(cx, ticket, outcome))
    }

    fn destroy_instances(&mut self, cx: &mut Surface<'_>) {
        for (_, mut viewer) in self.instances.drain(..) {
            viewer.destroy(cx);
        }
    }
}

fn is_overlay_node(doc: &Document, node: NodeId) -> bool {
    doc.closest(node, |n| doc.has_class(n, classes::BACKDROP))
        .is_some()
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("partitions", &self.partitions())
            .field("refresh_pending", &self.is_refresh_pending())
            .field("init_count", &self.init_count)
            .finish()
    }
}
