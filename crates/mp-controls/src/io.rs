//! Feedback and output collaborators.
//!
//! A control loop reads its process variable from a [`FeedbackSource`] and
//! commands its actuator through an [`OutputSink`]. Both are scalar and
//! assumed cheap: one read and at most one write per control cycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Provides the current process variable (e.g. encoder position).
pub trait FeedbackSource: Send {
    /// Current reading. Should be free of side effects.
    fn read(&self) -> f64;
}

/// Consumes the commanded output (e.g. motor power).
pub trait OutputSink: Send {
    fn write(&mut self, value: f64);
}

impl<F> FeedbackSource for F
where
    F: Fn() -> f64 + Send,
{
    fn read(&self) -> f64 {
        self()
    }
}

impl<F> OutputSink for F
where
    F: FnMut(f64) + Send,
{
    fn write(&mut self, value: f64) {
        self(value)
    }
}

/// A scalar shared between threads without locking.
///
/// Clones refer to the same value. Works as both a feedback source (a sensor
/// thread stores readings) and an output sink (an actuator thread loads the
/// latest command).
#[derive(Clone, Debug)]
pub struct SharedSignal {
    bits: Arc<AtomicU64>,
}

impl SharedSignal {
    pub fn new(value: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(value.to_bits())),
        }
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }
}

impl Default for SharedSignal {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl FeedbackSource for SharedSignal {
    fn read(&self) -> f64 {
        self.get()
    }
}

impl OutputSink for SharedSignal {
    fn write(&mut self, value: f64) {
        self.set(value);
    }
}

/// Output sink that keeps every value written to it.
///
/// Clones share the same history.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    writes: Arc<Mutex<Vec<f64>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All values written so far, oldest first.
    pub fn writes(&self) -> Vec<f64> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent write, if any.
    pub fn last(&self) -> Option<f64> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
    }

    pub fn len(&self) -> usize {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OutputSink for RecordingSink {
    fn write(&mut self, value: f64) {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value);
    }
}
