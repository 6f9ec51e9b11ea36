//! Integration test: control cycle scenarios against shared collaborators.
//!
//! Covers:
//! - Pure proportional response and convergence to zero output
//! - Anti-windup zoning across several 1 ms cycles
//! - Disable always leaving a zero on the actuator
//! - Retuning from a second thread through a lock
//! - Dashboard edits firing the change notifier

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use mp_controls::{
    ControlLoop, Gains, Inspectable, LoopConfig, PropertyValue, RecordingSink, SharedSignal,
};
use mp_core::ManualClock;

#[test]
fn proportional_loop_follows_feedback() {
    let sensor = SharedSignal::new(10.0);
    let motor = RecordingSink::new();
    let clock = ManualClock::new();
    let mut pid = ControlLoop::with_clock(
        "drive",
        LoopConfig::new(Gains::proportional(1.0)),
        sensor.clone(),
        clock.clone(),
    )
    .with_output(motor.clone());

    pid.set_setpoint(15.0);
    clock.advance_secs(0.02).unwrap();
    pid.calculate();
    assert_eq!(motor.last(), Some(5.0));

    sensor.set(15.0);
    clock.advance_secs(0.02).unwrap();
    pid.calculate();
    assert_eq!(motor.last(), Some(0.0));
    assert_eq!(pid.get(), 0.0);
}

#[test]
fn integral_only_builds_near_target() {
    let sensor = SharedSignal::new(0.0);
    let clock = ManualClock::new();
    let config = LoopConfig::new(Gains::new(0.0, 1.0, 0.0, 0.0)).with_integral_error_zone(1.0);
    let mut pid = ControlLoop::with_clock("arm", config, sensor.clone(), clock.clone());

    pid.set_setpoint(5.0);
    for _ in 0..3 {
        clock.advance(Duration::from_millis(1));
        pid.calculate();
        assert_eq!(pid.accumulated_integral(), 0.0);
    }

    sensor.set(4.5);
    for _ in 0..2 {
        clock.advance(Duration::from_millis(1));
        pid.calculate();
    }
    assert!((pid.accumulated_integral() - 1.0).abs() < 1e-12);
}

#[test]
fn disable_leaves_actuator_at_zero() {
    let sensor = SharedSignal::new(0.0);
    let motor = SharedSignal::new(0.0);
    let clock = ManualClock::new();
    let mut pid = ControlLoop::with_clock(
        "intake",
        LoopConfig::new(Gains::new(2.0, 0.0, 0.0, 1.0)),
        sensor.clone(),
        clock.clone(),
    )
    .with_output(motor.clone());

    pid.enable();
    pid.set_setpoint(3.0);
    for _ in 0..5 {
        clock.advance_secs(0.01).unwrap();
        pid.calculate();
    }
    assert!(motor.get() > 0.0);

    pid.disable();
    assert_eq!(motor.get(), 0.0);
    assert!(!pid.is_enabled());
}

#[test]
fn tuning_from_another_thread() {
    let sensor = SharedSignal::new(0.0);
    let motor = RecordingSink::new();
    let clock = ManualClock::new();
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = notified.clone();

    let pid = ControlLoop::with_clock(
        "turret",
        LoopConfig::new(Gains::proportional(1.0)),
        sensor.clone(),
        clock.clone(),
    )
    .with_output(motor.clone())
    .with_notifier(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let pid = Arc::new(Mutex::new(pid));

    let tuner = {
        let pid = Arc::clone(&pid);
        thread::spawn(move || {
            let mut pid = pid.lock().unwrap();
            pid.set_p(3.0);
            pid.set_setpoint(2.0);
        })
    };
    tuner.join().unwrap();

    clock.advance_secs(0.02).unwrap();
    let result = pid.lock().unwrap().calculate();
    assert_eq!(result, 6.0);
    assert_eq!(motor.last(), Some(6.0));
    assert_eq!(notified.load(Ordering::SeqCst), 1);
}

#[test]
fn dashboard_edits_notify() {
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = notified.clone();
    let mut pid = ControlLoop::with_clock(
        "wrist",
        LoopConfig::default(),
        SharedSignal::new(1.0),
        ManualClock::new(),
    )
    .with_notifier(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    pid.set_property("targetZone", PropertyValue::Number(0.5))
        .unwrap();
    pid.set_property("setpoint", PropertyValue::Number(1.2))
        .unwrap();
    assert!(pid.set_property("current", PropertyValue::Number(0.0)).is_err());

    assert_eq!(notified.load(Ordering::SeqCst), 1);
    assert!(pid.on_target());
    assert_eq!(
        pid.snapshot().get("targetZone"),
        Some(PropertyValue::Number(0.5))
    );
}
