//! Fixed-rate scheduling of the control cycle.
//!
//! The control loop runs at its own period, coarser than the plant
//! integration step. Between samples the last command is held (zero-order
//! hold) by the output signal.

use mp_core::ensure_positive;
use serde::{Deserialize, Serialize};

use crate::error::SimResult;

/// Sample configuration for a control loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Sample period in seconds.
    pub dt: f64,
}

impl SampleConfig {
    /// Create a sample configuration from a period in seconds.
    pub fn new(dt: f64) -> SimResult<Self> {
        let dt = ensure_positive(dt, "sample period")?;
        Ok(Self { dt })
    }
}

/// Tracks when the control loop should run next.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleClock {
    config: SampleConfig,
    next_sample_time: f64,
}

impl SampleClock {
    /// The first sample is one period after `initial_time`.
    pub fn new(config: SampleConfig, initial_time: f64) -> Self {
        Self {
            config,
            next_sample_time: initial_time + config.dt,
        }
    }

    /// Returns `true` if `current_time >= next_sample_time`.
    pub fn should_sample(&self, current_time: f64) -> bool {
        current_time >= self.next_sample_time
    }

    /// Advance to the next sample time. Call after running a sample.
    pub fn advance(&mut self) {
        self.next_sample_time += self.config.dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_creation() {
        let config = SampleConfig::new(0.1).unwrap();
        assert_eq!(config.dt, 0.1);
        assert!(SampleConfig::new(0.0).is_err());
    }

    #[test]
    fn sample_clock_basic() {
        let config = SampleConfig::new(0.1).unwrap();
        let mut clock = SampleClock::new(config, 0.0);

        assert!(!clock.should_sample(0.0));
        assert!(clock.should_sample(0.1));

        clock.advance();
        assert!(!clock.should_sample(0.1));
        assert!(clock.should_sample(0.2));
    }
}

