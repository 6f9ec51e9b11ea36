//! Tuning configuration for a control loop.
//!
//! Gains and zoning thresholds are plain data. No validation is applied: any
//! sign and any magnitude is accepted, and keeping the tuning sane is up to
//! whoever edits it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ControlResult;

/// PID gains plus the feed-forward factor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain, applied to error accumulated over milliseconds.
    pub ki: f64,
    /// Derivative gain, applied to error change per millisecond.
    pub kd: f64,
    /// Weight of the previous output carried into the next one. Usually 0 or 1.
    pub kf: f64,
}

impl Gains {
    pub fn new(kp: f64, ki: f64, kd: f64, kf: f64) -> Self {
        Self { kp, ki, kd, kf }
    }

    /// Proportional-only gains.
    pub fn proportional(kp: f64) -> Self {
        Self {
            kp,
            ..Self::default()
        }
    }
}

/// Everything needed to tune one control loop.
///
/// # Example
///
/// ```
/// use mp_controls::LoopConfig;
///
/// let config = LoopConfig::from_yaml_str(
///     "gains: { kp: 0.8, ki: 0.1 }\nintegral_error_zone: 2.0\ntarget_zone: 0.05\ntarget_time: 0.25\n",
/// )
/// .unwrap();
/// assert_eq!(config.gains.kp, 0.8);
/// assert_eq!(config.gains.kd, 0.0);
/// assert_eq!(config.target_time, 0.25);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub gains: Gains,
    /// The integral only accumulates while `|error|` is at most this.
    pub integral_error_zone: f64,
    /// `|error|` must be strictly below this to count as on target.
    pub target_zone: f64,
    /// Seconds the loop must stay on target before it counts as settled.
    pub target_time: f64,
}

impl LoopConfig {
    pub fn new(gains: Gains) -> Self {
        Self {
            gains,
            ..Self::default()
        }
    }

    pub fn with_integral_error_zone(mut self, zone: f64) -> Self {
        self.integral_error_zone = zone;
        self
    }

    pub fn with_target_zone(mut self, zone: f64) -> Self {
        self.target_zone = zone;
        self
    }

    pub fn with_target_time(mut self, seconds: f64) -> Self {
        self.target_time = seconds;
        self
    }

    pub fn from_yaml_str(content: &str) -> ControlResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> ControlResult<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

pub fn load_yaml(path: &Path) -> ControlResult<LoopConfig> {
    let content = std::fs::read_to_string(path)?;
    LoopConfig::from_yaml_str(&content)
}

pub fn load_json(path: &Path) -> ControlResult<LoopConfig> {
    let content = std::fs::read_to_string(path)?;
    LoopConfig::from_json_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ControlError;

    #[test]
    fn missing_fields_default_to_zero() {
        let config = LoopConfig::from_yaml_str("target_zone: 0.5\n").unwrap();
        assert_eq!(config.gains, Gains::default());
        assert_eq!(config.integral_error_zone, 0.0);
        assert_eq!(config.target_zone, 0.5);
    }

    #[test]
    fn json_and_yaml_agree() {
        let yaml = LoopConfig::from_yaml_str(
            "gains: { kp: 1.0, ki: 0.5, kd: 0.1, kf: 1.0 }\nintegral_error_zone: 3.0\n",
        )
        .unwrap();
        let json = LoopConfig::from_json_str(
            r#"{"gains": {"kp": 1.0, "ki": 0.5, "kd": 0.1, "kf": 1.0}, "integral_error_zone": 3.0}"#,
        )
        .unwrap();
        assert_eq!(yaml, json);
    }

    #[test]
    fn negative_values_are_accepted() {
        let config = LoopConfig::new(Gains::new(-1.0, 0.0, -0.5, 0.0)).with_target_time(-1.0);
        assert_eq!(config.gains.kp, -1.0);
        assert_eq!(config.target_time, -1.0);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = LoopConfig::from_yaml_str("gains: [1, 2").unwrap_err();
        assert!(matches!(err, ControlError::Yaml(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_yaml(Path::new("/nonexistent/loop.yaml")).unwrap_err();
        assert!(matches!(err, ControlError::Io(_)));
    }
}
