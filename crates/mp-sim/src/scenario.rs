//! Scenario files: a control loop, a plant and a run configuration.
//!
//! ```yaml
//! name: arm
//! subsystem: shoulder
//! setpoint: 1.0
//! control:
//!   gains: { kp: 2.0, ki: 0.0005, kd: 50.0 }
//!   integral_error_zone: 0.2
//!   target_zone: 0.01
//!   target_time: 0.25
//! plant:
//!   gain: 2.0
//!   tau: 0.1
//! options:
//!   t_end: 4.0
//! ```

use std::path::Path;

use mp_controls::LoopConfig;
use mp_core::ensure_finite;
use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::plant::PlantConfig;
use crate::sim::SimOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub name: String,
    pub subsystem: Option<String>,
    /// Whether the loop starts enabled. A disabled loop commands zero.
    pub enabled: bool,
    pub setpoint: f64,
    pub control: LoopConfig,
    pub plant: PlantConfig,
    pub options: SimOptions,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: "axis".to_string(),
            subsystem: None,
            enabled: true,
            setpoint: 0.0,
            control: LoopConfig::default(),
            plant: PlantConfig::default(),
            options: SimOptions::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn from_yaml_str(content: &str) -> SimResult<Self> {
        let scenario: Self = serde_yaml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Checks the plant and run options. Control tuning is taken as-is.
    pub fn validate(&self) -> SimResult<()> {
        ensure_finite(self.setpoint, "setpoint")?;
        self.plant.validate()?;
        self.options.validate()?;
        Ok(())
    }
}

pub fn load_yaml(path: &Path) -> SimResult<ScenarioConfig> {
    let content = std::fs::read_to_string(path)?;
    ScenarioConfig::from_yaml_str(&content)
}
