//! The viewer contract shared by the adapter and any viewer implementation.
//!
//! The adapter never knows which implementation it drives. It asks the
//! [`ViewerRegistry`] for the installed [`ViewerFactory`] and hands each
//! partition a [`ViewerOptions`]; whatever comes back only has to implement
//! [`Viewer`]. The fallback engine ([`crate::engine::FallbackFactory`]) is
//! one such factory; a bridge to a third-party library in the browser would
//! be another, serializing [`ViewerOptions`] to the library's option object.
//!
//! Late availability is explicit: installing a factory notifies every
//! subscriber with a [`ReadySignal`].

use crate::dom::{Document, NodeId};
use crate::events::{Dispatch, KeyEvent};
use crate::preload::{ImageLoader, LoadOutcome, LoadTicket};
use crate::timers::Timers;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Visual transition style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Slide,
    Fade,
    Zoom,
    None,
}

impl Effect {
    pub const ALL: [Effect; 4] = [Effect::Slide, Effect::Fade, Effect::Zoom, Effect::None];

    /// Parse an effect name. Only the four canonical lowercase names are
    /// accepted.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "slide" => Some(Effect::Slide),
            "fade" => Some(Effect::Fade),
            "zoom" => Some(Effect::Zoom),
            "none" => Some(Effect::None),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Effect::Slide => "slide",
            Effect::Fade => "fade",
            Effect::Zoom => "zoom",
            Effect::None => "none",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options handed to a viewer factory for one partition.
///
/// Serializes to the option object a gallery library expects:
/// `{selector, touchNavigation, loop, slideEffect, openEffect?, closeEffect?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerOptions {
    pub selector: String,
    pub touch_navigation: bool,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub slide_effect: Effect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_effect: Option<Effect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_effect: Option<Effect>,
}

impl ViewerOptions {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            touch_navigation: true,
            looping: false,
            slide_effect: Effect::Slide,
            open_effect: None,
            close_effect: None,
        }
    }
}

/// Mutable view of the page handed to viewers for the duration of one event.
pub struct Surface<'a> {
    pub doc: &'a mut Document,
    pub timers: &'a mut Timers,
    loader: &'a mut dyn ImageLoader,
    next_ticket: &'a mut u64,
}

impl<'a> Surface<'a> {
    pub fn new(
        doc: &'a mut Document,
        timers: &'a mut Timers,
        loader: &'a mut dyn ImageLoader,
        next_ticket: &'a mut u64,
    ) -> Self {
        Self {
            doc,
            timers,
            loader,
            next_ticket,
        }
    }

    /// Start an off-screen load of `src` and return its ticket.
    pub fn preload(&mut self, src: &str) -> LoadTicket {
        let ticket = LoadTicket(*self.next_ticket);
        *self.next_ticket += 1;
        self.loader.preload(ticket, src);
        ticket
    }
}

/// One running viewer bound to a selector partition.
pub trait Viewer {
    /// Handle a click whose target is `target`.
    fn handle_click(&mut self, cx: &mut Surface<'_>, target: NodeId) -> Dispatch;

    /// Handle a document-level keydown.
    fn handle_key(&mut self, cx: &mut Surface<'_>, event: &KeyEvent) -> Dispatch;

    /// Apply a preload outcome. Returns `true` if the ticket belonged to
    /// this viewer's current request.
    fn finish_preload(
        &mut self,
        cx: &mut Surface<'_>,
        ticket: LoadTicket,
        outcome: LoadOutcome,
    ) -> bool;

    /// Re-scan the document for trigger elements.
    fn refresh(&mut self, cx: &mut Surface<'_>);

    /// Release everything. Implementations without teardown needs may keep
    /// the default.
    fn destroy(&mut self, _cx: &mut Surface<'_>) {}

    fn is_open(&self) -> bool {
        false
    }
}

/// Creates viewers; the global entry point of a gallery library.
pub trait ViewerFactory {
    fn create(&self, options: ViewerOptions, cx: &mut Surface<'_>) -> Option<Box<dyn Viewer>>;
}

/// Sent to subscribers when a factory becomes available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadySignal {
    /// Who installed the factory, for diagnostics (e.g. `"fallback"`).
    pub source: String,
}

type ReadyListener = Box<dyn FnMut(&ReadySignal)>;

/// Holds the active viewer factory and notifies subscribers when one is
/// installed.
#[derive(Default)]
pub struct ViewerRegistry {
    factory: Option<Rc<dyn ViewerFactory>>,
    listeners: Vec<ReadyListener>,
}

impl ViewerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory(&self) -> Option<Rc<dyn ViewerFactory>> {
        self.factory.clone()
    }

    pub fn is_available(&self) -> bool {
        self.factory.is_some()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ReadySignal) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Install `factory`, replacing any previous one, and notify subscribers.
    pub fn install(&mut self, factory: Rc<dyn ViewerFactory>, source: &str) {
        self.factory = Some(factory);
        let signal = ReadySignal {
            source: source.to_string(),
        };
        debug!(
            source = %signal.source,
            listeners = self.listeners.len(),
            "viewer factory installed"
        );
        for listener in &mut self.listeners {
            listener(&signal);
        }
    }
}

impl fmt::Debug for ViewerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerRegistry")
            .field("available", &self.is_available())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
