#![forbid(unsafe_code)]

//! Host-driven monotonic clock.
//!
//! The bridge never reads wall-clock time itself. The host (a JS event loop,
//! or a test) advances the clock explicitly, which keeps debounce decisions
//! deterministic: identical call sequences yield identical flushes.

use core::time::Duration;

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HostClock {
    now: Duration,
}

impl HostClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Current monotonic time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Set current monotonic time.
    ///
    /// Host timestamps (e.g. `performance.now()`) may jitter backwards by a
    /// fraction of a millisecond; the clock never moves back.
    pub fn set(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}
