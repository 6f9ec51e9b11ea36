//! Closed-loop simulation harness for momentum control loops.
//!
//! Provides:
//! - A first-order motor plant to close the loop around
//! - Fixed-step ForwardEuler / RK4 integrators
//! - Sampled scheduling of the control cycle, independent of the plant step
//! - Scenario files (YAML) and recorded traces

pub mod error;
pub mod integrator;
pub mod model;
pub mod plant;
pub mod sampled;
pub mod scenario;
pub mod sim;

pub use error::{SimError, SimResult};
pub use integrator::{ForwardEuler, Integrator, RK4};
pub use model::TransientModel;
pub use plant::{Measurement, MotorPlant, MotorState, PlantConfig};
pub use sampled::{SampleClock, SampleConfig};
pub use scenario::ScenarioConfig;
pub use sim::{IntegratorType, SimOptions, Trace, TraceSample, run_closed_loop};
