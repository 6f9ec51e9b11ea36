//! Single-loop PID control for momentum.
//!
//! The centre of this crate is [`ControlLoop`]: one instance per controlled
//! axis, owning its gains, zoning thresholds, setpoint and running
//! integral/derivative state. Each call to [`ControlLoop::calculate`] reads the
//! feedback source once, evaluates the control law and writes the command to
//! the output sink.
//!
//! # Architecture
//!
//! - Collaborators are traits: [`FeedbackSource`], [`OutputSink`],
//!   [`ChangeNotifier`] and the [`mp_core::Clock`]
//! - Tuning is plain data ([`LoopConfig`]) loadable from YAML or JSON
//! - Live inspection and editing goes through [`Inspectable`]
//! - Scheduling is external; anything that can call `calculate` at a steady
//!   rate can drive a loop

pub mod config;
pub mod control_loop;
pub mod error;
pub mod io;
pub mod motion;
pub mod notifier;
pub mod telemetry;

pub use config::{Gains, LoopConfig};
pub use control_loop::{ControlLoop, DEFAULT_SUBSYSTEM};
pub use error::{ControlError, ControlResult};
pub use io::{FeedbackSource, OutputSink, RecordingSink, SharedSignal};
pub use motion::MotionController;
pub use notifier::{ChangeNotifier, NoopNotifier};
pub use telemetry::{
    Access, Inspectable, PropertyDescriptor, PropertyKind, PropertyValue, TelemetrySnapshot,
};
