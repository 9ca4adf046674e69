//! Tap disambiguator for dashboard cards.
//!
//! Cards have two tap meanings: a single tap flips the card to reveal the
//! back ("peek"), a quick second tap navigates to the card's screen
//! ("commit"). There is no native double-tap primitive, so this tracks a
//! counter with a 500 ms reset window. The window deadline is cancelled
//! outright when the second tap lands, rather than left to fire into a
//! reset counter.

use std::time::{Duration, Instant};

/// How long after a first tap a second tap still counts as a double tap.
pub const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(500);

/// What a tap resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapAction {
    /// First tap: flip the card.
    Peek,
    /// Second tap within the window: navigate.
    Commit,
}

/// Per-card tap state. Lives only within one gesture window.
#[derive(Debug, Default)]
pub struct TapTracker {
    count: u8,
    reset_deadline: Option<Instant>,
}

impl TapTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tap and resolve what it means.
    pub fn tap(&mut self, now: Instant) -> TapAction {
        // A stale window that was never polled counts as expired
        if let Some(deadline) = self.reset_deadline {
            if now >= deadline {
                self.count = 0;
                self.reset_deadline = None;
            }
        }

        if self.count == 0 {
            self.count = 1;
            self.reset_deadline = Some(now + DOUBLE_TAP_WINDOW);
            TapAction::Peek
        } else {
            self.count = 0;
            self.reset_deadline = None;
            TapAction::Commit
        }
    }

    /// Expire the window if its deadline has passed. Safe to call at any
    /// time; expiring an already-reset tracker is a no-op.
    pub fn poll(&mut self, now: Instant) {
        if let Some(deadline) = self.reset_deadline {
            if now >= deadline {
                self.count = 0;
                self.reset_deadline = None;
            }
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.reset_deadline
    }

    pub fn count(&self) -> u8 {
        self.count
    }
}
