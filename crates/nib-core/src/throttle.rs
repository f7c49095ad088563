//! Leading-and-trailing edge rate limiter for repaints.
//!
//! The first call in a burst fires immediately; further calls inside the
//! window mark a pending trailing edge that fires once the window
//! elapses. The runtime is cooperative, so trailing edges are collected
//! by the driver's tick rather than by a timer thread.

use std::time::{Duration, Instant};

/// The repaint coalescing window.
pub const RENDER_WINDOW: Duration = Duration::from_millis(32);

/// A leading-and-trailing rate limiter.
#[derive(Clone, Debug)]
pub struct Throttle {
    window: Duration,
    last_fire: Option<Instant>,
    pending: bool,
}

impl Throttle {
    /// Create a limiter with the given window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fire: None,
            pending: false,
        }
    }

    /// Request a fire at `now`.
    ///
    /// Returns true when the caller should fire immediately (leading
    /// edge); otherwise a trailing edge is marked pending.
    pub fn acquire(&mut self, now: Instant) -> bool {
        match self.last_fire {
            Some(last) if now.duration_since(last) < self.window => {
                self.pending = true;
                false
            }
            _ => {
                self.last_fire = Some(now);
                self.pending = false;
                true
            }
        }
    }

    /// Whether a pending trailing edge is due at `now`.
    pub fn trailing_due(&self, now: Instant) -> bool {
        self.pending
            && self
                .last_fire
                .is_none_or(|last| now.duration_since(last) >= self.window)
    }

    /// Consume a due trailing edge. Returns true when the caller should
    /// fire now.
    pub fn take_trailing(&mut self, now: Instant) -> bool {
        if self.trailing_due(now) {
            self.last_fire = Some(now);
            self.pending = false;
            true
        } else {
            false
        }
    }

    /// Whether a trailing edge is pending (due or not).
    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// Drop any pending trailing edge.
    pub fn cancel(&mut self) {
        self.pending = false;
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(RENDER_WINDOW)
    }
}
