//! Closed-loop simulation runner and trace recording.

use std::fmt::Write as _;
use std::path::Path;

use mp_controls::{ControlLoop, FeedbackSource, MotionController, SharedSignal};
use mp_core::{Clock, ManualClock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SimError, SimResult};
use crate::integrator::{ForwardEuler, Integrator, RK4};
use crate::model::TransientModel;
use crate::plant::MotorPlant;
use crate::sampled::{SampleClock, SampleConfig};
use crate::scenario::ScenarioConfig;

/// Integrator selection for the plant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorType {
    /// 4th-order Runge-Kutta (default, most accurate, 4 rhs calls per step).
    #[default]
    Rk4,
    /// Forward Euler (1st-order, faster, 1 rhs call per step).
    ForwardEuler,
}

/// Options for simulation runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimOptions {
    /// Plant integration step (seconds)
    pub dt: f64,
    /// Control loop period (seconds)
    pub control_period: f64,
    /// Final simulation time (seconds)
    pub t_end: f64,
    /// Maximum number of plant steps (safety limit)
    pub max_steps: usize,
    /// Record every N-th control cycle (decimation)
    pub record_every: usize,
    /// Plant integrator (default: RK4)
    pub integrator: IntegratorType,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 1e-3,
            control_period: 0.02,
            t_end: 5.0,
            max_steps: 1_000_000,
            record_every: 1,
            integrator: IntegratorType::default(),
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "dt must be positive",
            });
        }
        if !(self.t_end >= 0.0 && self.t_end.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "t_end must be non-negative",
            });
        }
        if self.control_period < self.dt {
            return Err(SimError::InvalidArg {
                what: "control_period must be at least dt",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        if self.record_every == 0 {
            return Err(SimError::InvalidArg {
                what: "record_every must be positive",
            });
        }
        Ok(())
    }
}

/// State of the loop at one control cycle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TraceSample {
    pub t: f64,
    pub setpoint: f64,
    pub current: f64,
    pub output: f64,
    pub on_target: bool,
    pub settled: bool,
}

/// Record of a closed-loop run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Trace {
    pub samples: Vec<TraceSample>,
    /// First time the loop reported settled, if it ever did.
    pub settled_at: Option<f64>,
    /// Control cycles executed.
    pub cycles: usize,
    pub final_position: f64,
    pub final_velocity: f64,
}

impl Trace {
    pub fn last(&self) -> Option<&TraceSample> {
        self.samples.last()
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::from("t,setpoint,current,output,on_target,settled\n");
        for s in &self.samples {
            let _ = writeln!(
                out,
                "{},{},{},{},{},{}",
                s.t, s.setpoint, s.current, s.output, s.on_target, s.settled
            );
        }
        out
    }

    pub fn write_csv(&self, path: &Path) -> SimResult<()> {
        std::fs::write(path, self.to_csv())?;
        Ok(())
    }
}

/// Run one control cycle under a gating policy: disabled controllers
/// command zero instead of running their control law.
fn gated_cycle<M: MotionController>(controller: &mut M) {
    if controller.is_enabled() {
        controller.calculate();
    } else {
        controller.zero_output();
    }
}

/// Close a control loop around a motor plant and record what happens.
///
/// The loop is timed by a [`ManualClock`] that follows simulated time, so
/// runs are deterministic regardless of wall-clock speed.
pub fn run_closed_loop(scenario: &ScenarioConfig) -> SimResult<Trace> {
    scenario.validate()?;
    let opts = &scenario.options;

    let mut plant = MotorPlant::new(scenario.plant)?;
    let mut x = plant.initial_state();

    let clock = ManualClock::new();
    let measure = scenario.plant.measure;
    let feedback = SharedSignal::new(x.measured(measure));
    let command = SharedSignal::new(0.0);
    let mut pid = ControlLoop::with_clock(
        scenario.name.as_str(),
        scenario.control,
        feedback.clone(),
        clock.clone(),
    )
    .with_output(command.clone());
    if let Some(subsystem) = &scenario.subsystem {
        pid.set_subsystem(subsystem.as_str());
    }
    pid.set_setpoint(scenario.setpoint);
    pid.set_enabled(scenario.enabled);

    let mut sampler = SampleClock::new(SampleConfig::new(opts.control_period)?, 0.0);

    info!(
        scenario = %scenario.name,
        setpoint = scenario.setpoint,
        t_end = opts.t_end,
        "starting closed-loop simulation"
    );

    let mut t = 0.0;
    let mut step = 0;
    let mut cycles = 0;
    let mut settled_at = None;
    let mut samples = Vec::new();

    while t < opts.t_end && step < opts.max_steps {
        if sampler.should_sample(t) {
            gated_cycle(&mut pid);
            let settled = pid.on_target_for_time();
            if settled && settled_at.is_none() {
                debug!(t, "loop settled");
                settled_at = Some(t);
            }
            if cycles % opts.record_every == 0 {
                samples.push(TraceSample {
                    t,
                    setpoint: pid.setpoint(),
                    current: feedback.read(),
                    output: pid.get(),
                    on_target: pid.on_target(),
                    settled,
                });
            }
            cycles += 1;
            sampler.advance();
        }

        plant.set_command(command.get());
        x = match opts.integrator {
            IntegratorType::Rk4 => RK4.step(&mut plant, t, &x, opts.dt)?,
            IntegratorType::ForwardEuler => ForwardEuler.step(&mut plant, t, &x, opts.dt)?,
        };
        if !(x.position.is_finite() && x.velocity.is_finite()) {
            return Err(SimError::NonPhysical {
                what: "plant state diverged",
            });
        }
        feedback.set(x.measured(measure));

        clock.advance_secs(opts.dt)?;
        t += opts.dt;
        step += 1;
    }

    info!(
        scenario = %scenario.name,
        cycles,
        settled_at = ?settled_at,
        final_position = x.position,
        elapsed = ?clock.now(),
        "simulation finished"
    );

    Ok(Trace {
        samples,
        settled_at,
        cycles,
        final_position: x.position,
        final_velocity: x.velocity,
    })
}
