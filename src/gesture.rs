//! Double-tap detection
//!
//! Turns a stream of tap instants into capture events. Two taps no further
//! apart than the timeout form a double-tap; the pair is consumed, so a
//! third tap starts a fresh sequence.

use std::time::{Duration, Instant};

/// State of the double-tap detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    /// No pending tap
    Idle,
    /// One tap seen, waiting for the second
    AwaitingSecondTap,
}

/// Detects double-taps
#[derive(Debug, Clone)]
pub struct DoubleTapDetector {
    timeout: Duration,
    pending: Option<Instant>,
}

impl DoubleTapDetector {
    /// Create a detector with the given maximum gap between taps
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            pending: None,
        }
    }

    /// Register a tap; returns true when it completes a double-tap
    pub fn tap(&mut self, at: Instant) -> bool {
        match self.pending.take() {
            Some(first) if at.saturating_duration_since(first) <= self.timeout => {
                tracing::debug!(gap = ?at.saturating_duration_since(first), "double-tap");
                true
            }
            Some(first) => {
                tracing::trace!(gap = ?at.saturating_duration_since(first), "tap too late, restarting");
                self.pending = Some(at);
                false
            }
            None => {
                self.pending = Some(at);
                false
            }
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> GestureState {
        if self.pending.is_some() {
            GestureState::AwaitingSecondTap
        } else {
            GestureState::Idle
        }
    }

    /// Maximum gap between taps
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Forget any pending tap
    pub fn reset(&mut self) {
        self.pending = None;
    }
}
