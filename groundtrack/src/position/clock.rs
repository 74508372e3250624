//! Time source for fix timestamps.
//!
//! Position age is measured against an injected [`Clock`] so that drivers
//! replaying recorded telemetry, and tests, can control elapsed time.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Monotonic time source.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock.
///
/// Starts at the instant it was created and only moves when
/// [`advance`](Self::advance) or [`rewind`](Self::rewind) is called. Clones
/// share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    /// Move time backward, simulating a misbehaving clock.
    ///
    /// A rewind past the earliest representable instant is ignored.
    pub fn rewind(&self, by: Duration) {
        let mut now = self.now.lock();
        if let Some(earlier) = now.checked_sub(by) {
            *now = earlier;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}
