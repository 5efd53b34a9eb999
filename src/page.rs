//! Page runtime: the single owner of everything the lightbox touches.
//!
//! A [`Page`] holds the document model, the timer queue, the image loader,
//! the viewer registry, and the adapter. The host calls one method per
//! native event; each call runs to completion, then delivers the DOM
//! mutations it caused to the adapter's observer. Nothing is global, so two
//! pages in one process never share state.
//!
//! ```text
//! host event ──▶ Page ──▶ Adapter ──▶ Viewer(s) ──▶ Document / Timers / Loader
//!                  ▲                                        │
//!                  └──────────── mutation records ──────────┘
//! ```

use crate::adapter::Adapter;
use crate::classes;
use crate::config::LightboxSettings;
use crate::dom::{Document, NodeId};
use crate::engine::FallbackFactory;
use crate::events::KeyEvent;
use crate::preload::{ImageLoader, LoadOutcome, LoadTicket, QueuedLoader};
use crate::timers::{Task, Timers};
use crate::viewer::{ReadySignal, Surface, ViewerFactory, ViewerRegistry};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

pub struct Page<L: ImageLoader = QueuedLoader> {
    doc: Document,
    timers: Timers,
    loader: L,
    next_ticket: u64,
    registry: ViewerRegistry,
    adapter: Adapter,
    ready_inbox: Rc<RefCell<Vec<ReadySignal>>>,
    is_ready: bool,
}

impl Page<QueuedLoader> {
    /// A page with an empty document and a [`QueuedLoader`].
    pub fn with_settings(settings: LightboxSettings) -> Self {
        Self::new(settings, Document::new(), QueuedLoader::new())
    }
}

impl<L: ImageLoader> Page<L> {
    pub fn new(settings: LightboxSettings, doc: Document, loader: L) -> Self {
        let ready_inbox: Rc<RefCell<Vec<ReadySignal>>> = Rc::default();
        let mut registry = ViewerRegistry::new();
        let inbox = Rc::clone(&ready_inbox);
        registry.subscribe(move |signal| inbox.borrow_mut().push(signal.clone()));
        Self {
            doc,
            timers: Timers::new(),
            loader,
            next_ticket: 0,
            registry,
            adapter: Adapter::new(settings),
            ready_inbox,
            is_ready: false,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    pub fn registry(&self) -> &ViewerRegistry {
        &self.registry
    }

    /// Current host time in milliseconds.
    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    pub fn is_ready(&self) -> bool {
        self.is_ready
    }

    /// Host time at which the next queued task falls due.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// The document finished loading: initialize, and start observing
    /// mutations if the settings ask for it. Later calls are ignored.
    pub fn ready(&mut self) {
        if self.is_ready {
            return;
        }
        self.is_ready = true;
        // content built before ready is not "added" from the observer's view
        self.doc.take_mutations();
        self.init();
    }

    /// Install a viewer factory. If the page is already initialized, the
    /// adapter re-runs against it.
    pub fn install_viewer(&mut self, factory: Rc<dyn ViewerFactory>, source: &str) {
        self.registry.install(factory, source);
        let signals: Vec<ReadySignal> = self.ready_inbox.borrow_mut().drain(..).collect();
        if !self.is_ready {
            return;
        }
        for signal in signals {
            debug!(source = %signal.source, "viewer ready, re-initializing");
            self.init();
        }
    }

    /// Install the built-in fallback engine.
    pub fn install_fallback(&mut self) {
        self.install_viewer(Rc::new(FallbackFactory), "fallback");
    }

    /// Dispatch a click on `target`. Returns `true` if the host must
    /// prevent the default action.
    pub fn click(&mut self, target: NodeId) -> bool {
        let (adapter, mut cx) = self.split();
        let consumed = adapter.click(&mut cx, target).is_consumed();
        self.flush_mutations();
        consumed
    }

    /// Dispatch a document keydown. Returns `true` if the host must
    /// prevent the default action.
    pub fn keydown(&mut self, event: &KeyEvent) -> bool {
        let (adapter, mut cx) = self.split();
        let consumed = adapter.key(&mut cx, event).is_consumed();
        self.flush_mutations();
        consumed
    }

    /// Report the outcome of a preload. Returns `false` for stale tickets.
    pub fn finish_load(&mut self, ticket: LoadTicket, outcome: LoadOutcome) -> bool {
        let (adapter, mut cx) = self.split();
        let applied = adapter.finish_preload(&mut cx, ticket, outcome);
        self.flush_mutations();
        applied
    }

    /// Move host time forward by `ms`, running every task that falls due.
    pub fn advance(&mut self, ms: u64) {
        let until = self.timers.now().saturating_add(ms);
        while let Some(task) = self.timers.pop_due(until) {
            self.run_task(task);
            self.flush_mutations();
        }
        self.timers.set_now(until);
    }

    /// Change the document the way page scripts would, then let the
    /// observer see the result.
    pub fn mutate<R>(&mut self, f: impl FnOnce(&mut Document) -> R) -> R {
        let result = f(&mut self.doc);
        self.flush_mutations();
        result
    }

    fn init(&mut self) {
        let factory = self.registry.factory();
        let (adapter, mut cx) = self.split();
        adapter.init(&mut cx, factory);
        self.flush_mutations();
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::Reveal(root) => {
                if self.doc.is_connected(root) {
                    self.doc.add_class(root, classes::ACTIVE);
                }
            }
            Task::Teardown(root) => {
                self.doc.remove(root);
            }
            Task::Reinit => {
                let factory = self.registry.factory();
                let (adapter, mut cx) = self.split();
                adapter.run_scheduled_init(&mut cx, factory);
            }
        }
    }

    fn flush_mutations(&mut self) {
        let records = self.doc.take_mutations();
        if !self.is_ready || records.is_empty() {
            return;
        }
        let (adapter, mut cx) = self.split();
        adapter.observe(&mut cx, &records);
    }

    fn split(&mut self) -> (&mut Adapter, Surface<'_>) {
        let cx = Surface::new(
            &mut self.doc,
            &mut self.timers,
            &mut self.loader,
            &mut self.next_ticket,
        );
        (&mut self.adapter, cx)
    }
}

impl<L: ImageLoader> std::fmt::Debug for Page<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("ready", &self.is_ready)
            .field("now", &self.timers.now())
            .field("registry", &self.registry)
            .field("adapter", &self.adapter)
            .finish()
    }
}
