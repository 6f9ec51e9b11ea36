//! Monotonic time sources.
//!
//! Control loops measure the time between cycles and how long the feedback
//! has stayed on target. Both need a clock that never goes backward. Time is
//! reported as a `Duration` since an arbitrary, clock-specific epoch.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::{CoreError, CoreResult};

/// A monotonic time source.
pub trait Clock: Send {
    /// Time elapsed since this clock's epoch. Never decreases.
    fn now(&self) -> Duration;
}

/// Seconds from `since` to `now`, or 0 if `now` is not later.
pub fn elapsed_secs(now: Duration, since: Duration) -> f64 {
    now.saturating_sub(since).as_secs_f64()
}

/// Milliseconds from `since` to `now`, or 0 if `now` is not later.
pub fn elapsed_millis(now: Duration, since: Duration) -> f64 {
    // integer nanos keep whole-millisecond steps exact
    now.saturating_sub(since).as_nanos() as f64 / 1e6
}

/// Wall clock backed by [`Instant`], with its epoch at construction.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Explicitly advanced clock for simulation and tests.
///
/// Clones share the same time, so a harness can keep one handle and advance
/// it while a control loop owns another.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use mp_core::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let handle = clock.clone();
/// handle.advance(Duration::from_millis(20));
/// assert_eq!(clock.now(), Duration::from_millis(20));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock reading `start`.
    pub fn starting_at(start: Duration) -> Self {
        Self {
            nanos: Arc::new(AtomicU64::new(to_nanos(start))),
        }
    }

    /// Move time forward by `step`.
    pub fn advance(&self, step: Duration) {
        let step = to_nanos(step);
        let _ = self
            .nanos
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_add(step))
            });
    }

    /// Move time forward by `secs` seconds.
    pub fn advance_secs(&self, secs: f64) -> CoreResult<()> {
        let step = Duration::try_from_secs_f64(secs).map_err(|_| CoreError::InvalidArg {
            what: "clock step must be finite and non-negative",
        })?;
        self.advance(step);
        Ok(())
    }

    /// Jump to `at`. Earlier times are ignored so the clock stays monotonic.
    pub fn set(&self, at: Duration) {
        self.nanos.fetch_max(to_nanos(at), Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Acquire))
    }
}

fn to_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
