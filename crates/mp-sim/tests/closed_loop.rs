//! Integration test: position control of a first-order motor.
//!
//! Network: ControlLoop --[command]--> MotorPlant --[position]--> ControlLoop
//!
//! Test that demonstrates:
//! - A proportional loop drives an integrating plant onto its setpoint
//! - Settling is reported only after the loop has held the target zone
//! - Feed-forward (kf = 1) holds a velocity loop's command once the error is gone
//! - A disabled loop leaves the plant at rest
//! - Trace decimation and CSV export

use mp_controls::{Gains, LoopConfig};
use mp_sim::{
    IntegratorType, Measurement, PlantConfig, ScenarioConfig, SimOptions, run_closed_loop,
};

fn position_scenario() -> ScenarioConfig {
    ScenarioConfig {
        name: "arm".to_string(),
        subsystem: Some("shoulder".to_string()),
        enabled: true,
        setpoint: 1.0,
        control: LoopConfig::new(Gains::proportional(1.0))
            .with_target_zone(0.02)
            .with_target_time(0.25),
        plant: PlantConfig {
            gain: 2.0,
            tau: 0.1,
            command_limit: 1.0,
            initial_position: 0.0,
            measure: Measurement::Position,
        },
        options: SimOptions {
            t_end: 5.0,
            ..SimOptions::default()
        },
    }
}

#[test]
fn proportional_loop_settles_on_setpoint() {
    let trace = run_closed_loop(&position_scenario()).unwrap();

    assert!((trace.final_position - 1.0).abs() < 0.02);
    let settled_at = trace.settled_at.expect("loop should settle");
    assert!(settled_at > 0.25);
    assert!(settled_at < 5.0);

    // nothing reports settled before the settling time
    for sample in &trace.samples {
        assert_eq!(sample.settled, sample.t >= settled_at);
    }

    let first = trace.samples.first().unwrap();
    assert!(!first.on_target);
    assert!(first.output > 0.0);
    assert!(trace.last().unwrap().on_target);
}

#[test]
fn euler_and_rk4_agree() {
    let rk4 = run_closed_loop(&position_scenario()).unwrap();

    let mut scenario = position_scenario();
    scenario.options.integrator = IntegratorType::ForwardEuler;
    let euler = run_closed_loop(&scenario).unwrap();

    assert!((rk4.final_position - euler.final_position).abs() < 1e-2);
}

#[test]
fn feed_forward_holds_flywheel_speed() {
    let scenario = ScenarioConfig {
        name: "flywheel".to_string(),
        setpoint: 5.0,
        control: LoopConfig::new(Gains::new(0.01, 0.0, 0.0, 1.0)).with_target_zone(0.05),
        plant: PlantConfig {
            gain: 10.0,
            tau: 0.2,
            measure: Measurement::Velocity,
            ..PlantConfig::default()
        },
        options: SimOptions {
            t_end: 6.0,
            ..SimOptions::default()
        },
        ..ScenarioConfig::default()
    };

    let trace = run_closed_loop(&scenario).unwrap();
    assert!((trace.final_velocity - 5.0).abs() < 0.05);
    // the command stays put with no error left
    let last = trace.last().unwrap();
    assert!((last.output - 0.5).abs() < 0.01);
}

#[test]
fn disabled_loop_commands_nothing() {
    let mut scenario = position_scenario();
    scenario.enabled = false;
    scenario.options.t_end = 1.0;

    let trace = run_closed_loop(&scenario).unwrap();
    assert!(trace.samples.iter().all(|s| s.output == 0.0));
    assert_eq!(trace.final_position, 0.0);
    assert!(trace.settled_at.is_none());
}

#[test]
fn loop_at_rest_settles_after_target_time() {
    let mut scenario = position_scenario();
    scenario.setpoint = 0.0;
    scenario.options.t_end = 1.0;

    let trace = run_closed_loop(&scenario).unwrap();
    let settled_at = trace.settled_at.unwrap();
    assert!(settled_at > 0.25 && settled_at < 0.35);
}

#[test]
fn decimated_trace_exports_csv() {
    let mut scenario = position_scenario();
    scenario.options.t_end = 1.0;
    scenario.options.record_every = 10;

    let trace = run_closed_loop(&scenario).unwrap();
    assert_eq!(trace.samples.len(), trace.cycles.div_ceil(10));

    let csv = trace.to_csv();
    assert!(csv.starts_with("t,setpoint,current,output,on_target,settled\n"));
    assert_eq!(csv.lines().count(), trace.samples.len() + 1);
}

#[test]
fn invalid_options_are_rejected() {
    let mut scenario = position_scenario();
    scenario.options.dt = -1.0;
    assert!(run_closed_loop(&scenario).is_err());
}
