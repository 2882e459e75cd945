//! Time sources
//!
//! The engine only ever asks "how much time has passed since the clock's
//! origin", so a clock is anything that can answer that monotonically.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A monotonic time source
pub trait Clock {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;
}

/// Wall-clock time measured from when the clock was created
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is the current instant
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A controllable clock for tests and replays
///
/// Clones share the same current time, so a test can keep one handle and
/// give another to a routine.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a manual clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manual clock starting at a specific time
    pub fn at(time: Duration) -> Self {
        let clock = Self::new();
        clock.set(time);
        clock
    }

    /// Set the current time
    pub fn set(&self, time: Duration) {
        self.nanos.store(to_nanos(time), Ordering::SeqCst);
    }

    /// Advance time by a duration
    pub fn advance(&self, by: Duration) {
        let by = to_nanos(by);
        let _ = self
            .nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_add(by))
            });
    }

    /// Advance time by whole seconds
    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    /// Advance time by milliseconds
    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

fn to_nanos(time: Duration) -> u64 {
    u64::try_from(time.as_nanos()).unwrap_or(u64::MAX)
}
