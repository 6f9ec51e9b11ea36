//! The PID control loop.
//!
//! Control law, evaluated once per [`ControlLoop::calculate`]:
//!
//! ```text
//! error      = setpoint - current
//! integral   = 0                        if |error| > integral_error_zone
//!            = integral + error * dt    otherwise
//! derivative = (error - last_error) / dt
//! result     = kf * last_result + kp * error + ki * integral + kd * derivative
//! ```
//!
//! `dt` is in milliseconds, so `ki` is per error-millisecond and `kd` per
//! error change per millisecond. `target_time` is in seconds. The `kf` term feeds the loop's own previous output back
//! in, which suits velocity control where the output has to be held rather
//! than driven to zero at the setpoint.

use std::fmt;
use std::time::Duration;

use mp_core::{Clock, MonotonicClock, elapsed_millis, elapsed_secs};
use tracing::{debug, trace, warn};

use crate::config::{Gains, LoopConfig};
use crate::io::{FeedbackSource, OutputSink};
use crate::motion::MotionController;
use crate::notifier::{ChangeNotifier, NoopNotifier};

/// Subsystem label given to loops that were never assigned one.
pub const DEFAULT_SUBSYSTEM: &str = "Ungrouped";

/// A single-axis PID controller bound to its feedback source and output.
///
/// `enabled` is a flag for collaborators: [`calculate`](Self::calculate) runs
/// and writes whether or not the loop is enabled. Use
/// [`calculate_if_enabled`](Self::calculate_if_enabled) to gate on it.
///
/// Not internally synchronized. To tune from another thread, share it behind
/// a lock.
///
/// # Example
///
/// ```
/// use mp_controls::{ControlLoop, Gains, LoopConfig, RecordingSink, SharedSignal};
/// use mp_core::ManualClock;
///
/// let position = SharedSignal::new(10.0);
/// let sink = RecordingSink::new();
/// let clock = ManualClock::new();
///
/// let mut pid = ControlLoop::with_clock(
///     "arm",
///     LoopConfig::new(Gains::proportional(1.0)),
///     position.clone(),
///     clock.clone(),
/// )
/// .with_output(sink.clone());
///
/// pid.set_setpoint(15.0);
/// clock.advance_secs(0.02).unwrap();
/// assert_eq!(pid.calculate(), 5.0);
/// assert_eq!(sink.last(), Some(5.0));
/// ```
pub struct ControlLoop<S, C = MonotonicClock> {
    name: String,
    subsystem: String,

    kp: f64,
    ki: f64,
    kd: f64,
    kf: f64,
    integral_error_zone: f64,
    target_zone: f64,
    target_time: f64,

    setpoint: f64,
    last_result: f64,
    accumulated_integral: f64,
    last_error: f64,
    last_timestamp: Duration,
    on_target_since: Duration,
    enabled: bool,

    source: S,
    output: Option<Box<dyn OutputSink>>,
    notifier: Box<dyn ChangeNotifier>,
    clock: C,
}

impl<S: FeedbackSource> ControlLoop<S, MonotonicClock> {
    /// Create a loop timed by the system's monotonic clock.
    pub fn new(name: impl Into<String>, config: LoopConfig, source: S) -> Self {
        Self::with_clock(name, config, source, MonotonicClock::new())
    }
}

impl<S: FeedbackSource, C: Clock> ControlLoop<S, C> {
    /// Create a loop timed by `clock`.
    ///
    /// The setpoint starts at the source's current reading, so a fresh loop is
    /// on target and commands nothing until it is given somewhere to go.
    pub fn with_clock(name: impl Into<String>, config: LoopConfig, source: S, clock: C) -> Self {
        let setpoint = source.read();
        let now = clock.now();
        let Gains { kp, ki, kd, kf } = config.gains;
        Self {
            name: name.into(),
            subsystem: DEFAULT_SUBSYSTEM.to_string(),
            kp,
            ki,
            kd,
            kf,
            integral_error_zone: config.integral_error_zone,
            target_zone: config.target_zone,
            target_time: config.target_time,
            setpoint,
            last_result: 0.0,
            accumulated_integral: 0.0,
            last_error: 0.0,
            last_timestamp: now,
            on_target_since: now,
            enabled: false,
            source,
            output: None,
            notifier: Box::new(NoopNotifier),
            clock,
        }
    }

    /// Attach an output sink.
    pub fn with_output(mut self, output: impl OutputSink + 'static) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    /// Install a change notifier.
    pub fn with_notifier(mut self, notifier: impl ChangeNotifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Run one control cycle and return the new command.
    ///
    /// Reads the source once and writes the result to the output sink, if one
    /// is attached. The integral and derivative are taken over the
    /// milliseconds elapsed since the previous cycle. If no time has passed since the previous cycle the
    /// derivative is undefined, so the cycle is skipped: nothing is read,
    /// written or accumulated, and the previous result is returned.
    pub fn calculate(&mut self) -> f64 {
        let now = self.clock.now();
        let dt = elapsed_millis(now, self.last_timestamp);
        self.last_timestamp = self.last_timestamp.max(now);
        if dt <= 0.0 {
            warn!(loop_name = %self.name, "skipping control cycle with no elapsed time");
            return self.last_result;
        }

        let current = self.source.read();
        let error = self.setpoint - current;

        // Discharge the integral while far from the target.
        if error.abs() > self.integral_error_zone {
            self.accumulated_integral = 0.0;
        } else {
            self.accumulated_integral += error * dt;
        }

        let derivative = (error - self.last_error) / dt;
        self.last_error = error;

        let result = self.kf * self.last_result
            + self.kp * error
            + self.ki * self.accumulated_integral
            + self.kd * derivative;
        self.last_result = result;

        trace!(
            loop_name = %self.name,
            dt,
            current,
            error,
            integral = self.accumulated_integral,
            derivative,
            result,
            "control cycle"
        );

        self.write_output(result);
        result
    }

    /// Run [`calculate`](Self::calculate) only while enabled.
    pub fn calculate_if_enabled(&mut self) -> Option<f64> {
        if self.enabled {
            Some(self.calculate())
        } else {
            None
        }
    }

    /// Command zero immediately.
    pub fn zero_output(&mut self) {
        self.last_result = 0.0;
        self.write_output(0.0);
    }

    /// The most recent result, without recomputing.
    pub fn get(&self) -> f64 {
        self.last_result
    }

    /// Re-read the feedback source.
    pub fn current(&self) -> f64 {
        self.source.read()
    }

    /// Mark the loop enabled. Does not command anything by itself.
    pub fn enable(&mut self) {
        if !self.enabled {
            debug!(loop_name = %self.name, "control loop enabled");
        }
        self.enabled = true;
    }

    /// Zero the output, then mark the loop disabled.
    pub fn disable(&mut self) {
        self.zero_output();
        if self.enabled {
            debug!(loop_name = %self.name, "control loop disabled");
        }
        self.enabled = false;
    }

    /// [`enable`](Self::enable) or [`disable`](Self::disable).
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            self.enable();
        } else {
            self.disable();
        }
    }

    /// The flag only; see [`calculate_if_enabled`](Self::calculate_if_enabled).
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Target the feedback is driven toward.
    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Set an absolute setpoint. Not a tuning change, so nothing is notified.
    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    /// Set the setpoint `delta` away from where the feedback is now, not from
    /// the previous setpoint.
    pub fn set_setpoint_relative(&mut self, delta: f64) {
        self.setpoint = self.source.read() + delta;
    }

    /// Whether the feedback is strictly within `target_zone` of the setpoint.
    pub fn on_target(&self) -> bool {
        (self.setpoint - self.source.read()).abs() < self.target_zone
    }

    /// Whether the loop has stayed on target for longer than `target_time`.
    ///
    /// Being off target restarts the settling timer. Polling while on target
    /// does not.
    pub fn on_target_for_time(&mut self) -> bool {
        let now = self.clock.now();
        if self.on_target() {
            elapsed_secs(now, self.on_target_since) > self.target_time
        } else {
            self.on_target_since = now;
            false
        }
    }

    /// Proportional gain.
    pub fn p(&self) -> f64 {
        self.kp
    }

    /// Integral gain, per error-millisecond.
    pub fn i(&self) -> f64 {
        self.ki
    }

    /// Derivative gain, per error change per millisecond.
    pub fn d(&self) -> f64 {
        self.kd
    }

    /// Feed-forward gain on the previous result.
    pub fn f(&self) -> f64 {
        self.kf
    }

    /// Largest `|error|` at which the integral accumulates.
    pub fn err_zone(&self) -> f64 {
        self.integral_error_zone
    }

    /// Tolerance for [`on_target`](Self::on_target).
    pub fn target_zone(&self) -> f64 {
        self.target_zone
    }

    /// Seconds the loop must stay on target to count as settled.
    pub fn target_time(&self) -> f64 {
        self.target_time
    }

    /// Set the proportional gain and notify.
    pub fn set_p(&mut self, p: f64) {
        self.kp = p;
        self.parameters_changed("p");
    }

    /// Set the integral gain and notify.
    pub fn set_i(&mut self, i: f64) {
        self.ki = i;
        self.parameters_changed("i");
    }

    /// Set the derivative gain and notify.
    pub fn set_d(&mut self, d: f64) {
        self.kd = d;
        self.parameters_changed("d");
    }

    /// Set the feed-forward gain and notify.
    pub fn set_f(&mut self, f: f64) {
        self.kf = f;
        self.parameters_changed("f");
    }

    /// Set the integral error zone and notify.
    pub fn set_err_zone(&mut self, zone: f64) {
        self.integral_error_zone = zone;
        self.parameters_changed("errZone");
    }

    /// Set the on-target tolerance and notify.
    pub fn set_target_zone(&mut self, zone: f64) {
        self.target_zone = zone;
        self.parameters_changed("targetZone");
    }

    /// Set the settling time in seconds and notify.
    pub fn set_target_time(&mut self, seconds: f64) {
        self.target_time = seconds;
        self.parameters_changed("targetTime");
    }

    /// Current tuning as a config value.
    pub fn config(&self) -> LoopConfig {
        LoopConfig {
            gains: Gains::new(self.kp, self.ki, self.kd, self.kf),
            integral_error_zone: self.integral_error_zone,
            target_zone: self.target_zone,
            target_time: self.target_time,
        }
    }

    /// Replace, attach or detach (`None`) the output sink.
    pub fn set_output(&mut self, output: Option<Box<dyn OutputSink>>) {
        self.output = output;
    }

    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    /// Replace the change notifier.
    pub fn set_notifier(&mut self, notifier: impl ChangeNotifier + 'static) {
        self.notifier = Box::new(notifier);
    }

    /// Integral accumulated so far, in error-milliseconds.
    pub fn accumulated_integral(&self) -> f64 {
        self.accumulated_integral
    }

    /// Error seen by the last completed cycle.
    pub fn last_error(&self) -> f64 {
        self.last_error
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    pub fn set_subsystem(&mut self, subsystem: impl Into<String>) {
        self.subsystem = subsystem.into();
    }

    fn write_output(&mut self, value: f64) {
        if let Some(output) = self.output.as_mut() {
            output.write(value);
        }
    }

    fn parameters_changed(&mut self, key: &'static str) {
        debug!(loop_name = %self.name, parameter = key, "tuning changed");
        self.notifier.on_parameters_changed();
    }
}

impl<S: FeedbackSource, C: Clock> MotionController for ControlLoop<S, C> {
    fn calculate(&mut self) -> f64 {
        ControlLoop::calculate(self)
    }

    fn zero_output(&mut self) {
        ControlLoop::zero_output(self)
    }

    fn get(&self) -> f64 {
        ControlLoop::get(self)
    }

    fn is_enabled(&self) -> bool {
        ControlLoop::is_enabled(self)
    }
}

impl<S, C> fmt::Debug for ControlLoop<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlLoop")
            .field("name", &self.name)
            .field("subsystem", &self.subsystem)
            .field("kp", &self.kp)
            .field("ki", &self.ki)
            .field("kd", &self.kd)
            .field("kf", &self.kf)
            .field("integral_error_zone", &self.integral_error_zone)
            .field("target_zone", &self.target_zone)
            .field("target_time", &self.target_time)
            .field("setpoint", &self.setpoint)
            .field("last_result", &self.last_result)
            .field("accumulated_integral", &self.accumulated_integral)
            .field("enabled", &self.enabled)
            .field("has_output", &self.output.is_some())
            .finish_non_exhaustive()
    }
}
