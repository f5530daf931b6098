// SPDX-License-Identifier: MIT OR Apache-2.0
//! Debounced recomputation scheduling.
//!
//! Consumers layered on the store (derived-value re-evaluation,
//! minimaps) want to recompute after a burst of edits settles, not once
//! per edit. [`Debouncer`] is the cancellable-deadline primitive: every
//! `schedule` replaces the pending deadline, so a burst collapses into
//! a single firing after a quiescence window. Cancellation just drops
//! the deadline; there is no partial state to reconcile.
//!
//! Time is passed in by the caller, so the host decides what clock
//! drives this and tests never sleep.

use std::time::{Duration, Instant};

/// Default quiescence window.
pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(50);

/// A cancellable delayed trigger that coalesces rapid re-schedules.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIESCENCE)
    }
}

impl Debouncer {
    /// Create a debouncer with the given quiescence window.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// The configured quiescence window.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule (or re-schedule) the trigger `delay` after `now`. Any
    /// pending deadline is replaced.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Drop the pending trigger, if any.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether a trigger is pending.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fire if the deadline has passed. Returns `true` at most once per
    /// scheduled burst.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
