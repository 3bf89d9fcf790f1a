//! Injectable time capability for the timer interrupt.
//!
//! The dispatch loop polls a [`TimeSource`] once per cycle instead of the
//! wall clock directly, so tests can simulate elapsed time
//! deterministically.

use std::time::{Duration, Instant};

/// Monotonic time capability polled once per dispatch cycle.
pub trait TimeSource {
    /// Time elapsed since an arbitrary fixed epoch.
    fn now(&mut self) -> Duration;
}

/// Wall-clock time source for real execution, anchored at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    /// Creates a clock whose epoch is the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemClock {
    fn now(&mut self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Hand-advanced time source for deterministic tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualClock {
    now: Duration,
}

impl ManualClock {
    /// Moves simulated time forward by `delta`.
    pub fn advance(&mut self, delta: Duration) {
        self.now += delta;
    }
}

impl TimeSource for ManualClock {
    fn now(&mut self) -> Duration {
        self.now
    }
}
