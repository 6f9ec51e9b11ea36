//! Scheduler-facing controller interface.

/// A controller that a periodic scheduler can drive without knowing its
/// control law.
pub trait MotionController {
    /// Run one control cycle and return the new command.
    fn calculate(&mut self) -> f64;

    /// Command zero immediately.
    fn zero_output(&mut self);

    /// The most recent command.
    fn get(&self) -> f64;

    fn is_enabled(&self) -> bool;
}
