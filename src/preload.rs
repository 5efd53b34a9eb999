//! Off-screen image preloading.
//!
//! Rendering a slide never points the visible `<img>` at an unloaded URL.
//! The engine asks an [`ImageLoader`] to fetch the source off-screen and
//! tags the request with a [`LoadTicket`]. When the host learns the outcome
//! (an `Image` object's `load` or `error` event) it reports it back with the
//! same ticket; only the ticket a viewer is currently waiting on is applied,
//! so a slow load for a slide the user already left cannot overwrite the
//! newer one.
//!
//! [`QueuedLoader`] is the default implementation: it queues requests for
//! the host to drain.

/// Identifies one preload request. Unique per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(pub(crate) u64);

impl LoadTicket {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed,
}

/// Starts off-screen image fetches on behalf of the engine.
pub trait ImageLoader {
    fn preload(&mut self, ticket: LoadTicket, src: &str);
}

/// A request waiting for the host to fetch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub src: String,
}

/// Loader that queues requests for the host to drain and fulfil.
#[derive(Debug, Default)]
pub struct QueuedLoader {
    requests: Vec<LoadRequest>,
}

impl QueuedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests issued since the last drain.
    pub fn requests(&self) -> &[LoadRequest] {
        &self.requests
    }

    pub fn take_requests(&mut self) -> Vec<LoadRequest> {
        std::mem::take(&mut self.requests)
    }
}

impl ImageLoader for QueuedLoader {
    fn preload(&mut self, ticket: LoadTicket, src: &str) {
        self.requests.push(LoadRequest {
            ticket,
            src: src.to_string(),
        });
    }
}
