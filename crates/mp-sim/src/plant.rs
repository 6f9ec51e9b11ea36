//! First-order motor plant.
//!
//! Dynamics:
//!
//! ```text
//! u     = clamp(command, -command_limit, command_limit)
//! dv/dt = (gain * u - v) / tau
//! dx/dt = v
//! ```
//!
//! `gain` is the free-running speed per unit command and `tau` the
//! mechanical time constant. Good enough to close a position or velocity
//! loop around.

use mp_core::{ensure_finite, ensure_positive};
use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::model::TransientModel;

/// Which state the motor's sensor reports back to the control loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    #[default]
    Position,
    Velocity,
}

/// Motor parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    /// Steady-state speed per unit command (units/s).
    pub gain: f64,
    /// Mechanical time constant (seconds), must be positive.
    pub tau: f64,
    /// Largest command magnitude the motor accepts, must be positive.
    pub command_limit: f64,
    /// Position at t=0.
    pub initial_position: f64,
    /// Quantity fed back to the controller.
    pub measure: Measurement,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            gain: 1.0,
            tau: 0.1,
            command_limit: 1.0,
            initial_position: 0.0,
            measure: Measurement::Position,
        }
    }
}

impl PlantConfig {
    pub fn validate(&self) -> SimResult<()> {
        ensure_finite(self.gain, "plant gain")?;
        ensure_positive(self.tau, "plant tau")?;
        ensure_positive(self.command_limit, "plant command_limit")?;
        ensure_finite(self.initial_position, "plant initial_position")?;
        Ok(())
    }
}

/// Motor state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotorState {
    pub position: f64,
    pub velocity: f64,
}

impl MotorState {
    /// The quantity a sensor configured for `measure` would report.
    pub fn measured(&self, measure: Measurement) -> f64 {
        match measure {
            Measurement::Position => self.position,
            Measurement::Velocity => self.velocity,
        }
    }
}

/// Motor driven by a command held constant over each integration step.
#[derive(Clone, Debug)]
pub struct MotorPlant {
    config: PlantConfig,
    command: f64,
}

impl MotorPlant {
    pub fn new(config: PlantConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            command: 0.0,
        })
    }

    /// Set the command applied from now on. Clamped to the command limit;
    /// a non-finite command is treated as zero.
    pub fn set_command(&mut self, command: f64) {
        let limit = self.config.command_limit;
        self.command = if command.is_finite() {
            command.clamp(-limit, limit)
        } else {
            0.0
        };
    }

    /// Command actually applied after clamping.
    pub fn command(&self) -> f64 {
        self.command
    }
}

impl TransientModel for MotorPlant {
    type State = MotorState;

    fn initial_state(&self) -> MotorState {
        MotorState {
            position: self.config.initial_position,
            velocity: 0.0,
        }
    }

    fn rhs(&mut self, _t: f64, x: &MotorState) -> SimResult<MotorState> {
        let accel = (self.config.gain * self.command - x.velocity) / self.config.tau;
        Ok(MotorState {
            position: x.velocity,
            velocity: accel,
        })
    }

    fn add(&self, a: &MotorState, b: &MotorState) -> MotorState {
        MotorState {
            position: a.position + b.position,
            velocity: a.velocity + b.velocity,
        }
    }

    fn scale(&self, a: &MotorState, scale: f64) -> MotorState {
        MotorState {
            position: a.position * scale,
            velocity: a.velocity * scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::integrator::{Integrator, RK4};

    #[test]
    fn rejects_non_physical_config() {
        let bad_tau = PlantConfig {
            tau: 0.0,
            ..PlantConfig::default()
        };
        assert!(matches!(MotorPlant::new(bad_tau), Err(SimError::Core(_))));

        let bad_limit = PlantConfig {
            command_limit: -1.0,
            ..PlantConfig::default()
        };
        assert!(MotorPlant::new(bad_limit).is_err());
    }

    #[test]
    fn command_is_clamped() {
        let mut plant = MotorPlant::new(PlantConfig::default()).unwrap();
        plant.set_command(5.0);
        assert_eq!(plant.command(), 1.0);
        plant.set_command(-5.0);
        assert_eq!(plant.command(), -1.0);
        plant.set_command(f64::NAN);
        assert_eq!(plant.command(), 0.0);
    }

    #[test]
    fn velocity_approaches_gain_times_command() {
        let config = PlantConfig {
            gain: 4.0,
            tau: 0.05,
            ..PlantConfig::default()
        };
        let mut plant = MotorPlant::new(config).unwrap();
        plant.set_command(0.5);

        let mut x = plant.initial_state();
        let dt = 1e-3;
        for i in 0..1000 {
            x = RK4.step(&mut plant, i as f64 * dt, &x, dt).unwrap();
        }
        assert!((x.velocity - 2.0).abs() < 1e-6);
        assert!(x.position > 1.8);
        assert_eq!(x.measured(Measurement::Velocity), x.velocity);
        assert_eq!(x.measured(Measurement::Position), x.position);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::integrator::{ForwardEuler, Integrator};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn speed_never_exceeds_free_running_speed(
            commands in prop::collection::vec(-3.0_f64..3.0, 1..200),
        ) {
            let config = PlantConfig { gain: 2.0, tau: 0.1, ..PlantConfig::default() };
            let mut plant = MotorPlant::new(config).unwrap();
            let mut x = plant.initial_state();
            let dt = 1e-3;
            for (i, command) in commands.into_iter().enumerate() {
                plant.set_command(command);
                x = ForwardEuler.step(&mut plant, i as f64 * dt, &x, dt).unwrap();
                prop_assert!(x.velocity.abs() <= 2.0 + 1e-12);
            }
        }
    }
}
