//! Deterministic timer queue driven by the host clock.
//!
//! The engine never sleeps. Deferred work is queued here with a deadline in
//! host milliseconds, and the page fires due tasks when the host advances
//! time. Two delays are part of the contract:
//!
//! - [`REINIT_DEBOUNCE_MS`]: quiet window before a mutation-driven re-init.
//! - [`TEARDOWN_DELAY_MS`]: how long a closed overlay stays mounted so the
//!   exit transition can finish.
//!
//! Overlay reveal is queued with zero delay, which makes it fire on the next
//! host tick. That is the role `requestAnimationFrame` plays in a browser.

use crate::dom::NodeId;
use std::collections::BTreeMap;

pub const REINIT_DEBOUNCE_MS: u64 = 200;
pub const TEARDOWN_DELAY_MS: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// Work the page performs when a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Add the active class to a freshly mounted overlay.
    Reveal(NodeId),
    /// Remove a closed overlay from the document.
    Teardown(NodeId),
    /// Re-run adapter initialization.
    Reinit,
}

#[derive(Debug, Default)]
pub struct Timers {
    now: u64,
    next_id: u64,
    // Keyed by (deadline, id) so equal deadlines fire in scheduling order.
    queue: BTreeMap<(u64, u64), Task>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current host time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn schedule(&mut self, delay_ms: u64, task: Task) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.queue.insert((self.now.saturating_add(delay_ms), id), task);
        TimerId(id)
    }

    /// Cancel a pending timer. Returns `false` if it already fired.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|&(_, timer), _| timer != id.0);
        self.queue.len() != before
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.queue.keys().any(|&(_, timer)| timer == id.0)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Deadline of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.keys().next().map(|&(deadline, _)| deadline)
    }

    /// Pop the earliest task due at or before `until`, moving the clock to
    /// its deadline.
    pub fn pop_due(&mut self, until: u64) -> Option<Task> {
        let (&(deadline, id), _) = self.queue.iter().next()?;
        if deadline > until {
            return None;
        }
        let task = self.queue.remove(&(deadline, id))?;
        self.now = self.now.max(deadline);
        Some(task)
    }

    /// Move the clock forward without firing anything. Never goes backwards.
    pub fn set_now(&mut self, now: u64) {
        self.now = self.now.max(now);
    }
}
