//! # andW Lightbox
//!
//! Client-side engine of a lightbox add-on for a web publishing platform. The
//! server side rewrites qualifying images into trigger anchors; this crate
//! turns those anchors into an accessible overlay gallery with navigation,
//! captions, and transition effects.
//!
//! # Architecture: Host-Driven Engine
//!
//! The engine never touches a browser, a clock, or the network. A host (the
//! `web` module on wasm32, a test everywhere else) mirrors the page into a
//! [`dom::Document`] and forwards events to a [`page::Page`]:
//!
//! ```text
//! ready / click / keydown / image load / time ──▶ Page
//!                                                  │
//!                 ┌────────────────────────────────┤
//!                 ▼                                ▼
//!          Adapter (partitions)             ViewerRegistry
//!                 │  one viewer per effect         │  ReadySignal
//!                 ▼                                │
//!          Viewer ── Lightbox (fallback) ◀─────────┘
//!                 │
//!                 ▼
//!       Document mutations · Timers · Preload requests ──▶ host replays them
//! ```
//!
//! Every event runs to completion. Deferred work (overlay reveal, teardown
//! after close, debounced re-init) sits in [`timers::Timers`] until the host
//! advances time, and image loads wait for the host to report back with a
//! [`preload::LoadTicket`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`page`] | Owns document, timers, loader, registry, adapter; dispatches host events |
//! | [`adapter`] | Partitions triggers by effect, one viewer per partition, debounced re-init |
//! | [`engine`] | Fallback overlay viewer: collections, navigation, focus, preloading |
//! | [`viewer`] | `Viewer` / `ViewerFactory` traits, viewer options, ready-signal registry |
//! | [`trigger`] | Reads trigger attributes: image source, gallery, captions, labels |
//! | [`dom`] | Arena document model, selector engine, mutation records |
//! | [`config`] | Settings snapshot: JSON/TOML loading, normalization, validation, CSS |
//! | [`classes`] | Overlay CSS class contract and markup skeleton (Maud) |
//! | [`timers`] | Virtual-time task queue |
//! | [`preload`] | Off-screen image load requests and tickets |
//! | [`events`] | Keyboard events and dispatch results |
//! | [`output`] | CLI output formatting |
//! | `web` | wasm32 only: binds a `Page` to the live browser document |
//!
//! # Design Decisions
//!
//! ## No Globals
//!
//! The settings snapshot is a constructor argument, and the registry, the
//! adapter's instance list, and the debounce timer all live on a `Page`.
//! Two pages never interfere, which is what lets every behavior be tested
//! in-process.
//!
//! ## Explicit Ready Signal
//!
//! A gallery library may finish loading after the page is ready. Instead of
//! a global event, installing a factory in the [`viewer::ViewerRegistry`]
//! notifies subscribers, and the page re-runs the adapter.
//!
//! ## The DOM Is the Only Store
//!
//! Collections are rebuilt from the document on every open and slide
//! attributes are re-read on every render. Content injected after load is
//! picked up without cache invalidation.
//!
//! ## Tickets Over Callbacks
//!
//! A preload result is applied only if its ticket is the one the viewer is
//! waiting for. A slow image for a slide the user already left can never
//! overwrite the current one.

pub mod adapter;
pub mod classes;
pub mod config;
pub mod dom;
pub mod engine;
pub mod events;
pub mod output;
pub mod page;
pub mod preload;
pub mod timers;
pub mod trigger;
pub mod viewer;
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
pub(crate) mod test_helpers;
