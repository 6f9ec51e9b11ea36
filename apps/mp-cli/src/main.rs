use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

use mp_controls::{ControlError, ControlLoop, Inspectable, PropertyValue, SharedSignal};
use mp_sim::scenario::load_yaml;
use mp_sim::{ScenarioConfig, SimError, run_closed_loop};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mp-cli")]
#[command(about = "Momentum CLI - PID control loop simulation and inspection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a scenario file
    Validate {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
    },
    /// Close the loop around the simulated motor and report how it behaves
    Simulate {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
        /// Override the scenario's setpoint
        #[arg(long)]
        setpoint: Option<f64>,
        /// Override the end time in seconds
        #[arg(long)]
        t_end: Option<f64>,
        /// Write the recorded trace as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the loop's live properties as JSON
    Inspect {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
        /// Edit a property before printing, e.g. `--set p=0.4 --set enabled=false`
        #[arg(long = "set", value_name = "KEY=VALUE")]
        edits: Vec<String>,
    },
}

type CliResult<T> = Result<T, CliError>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error("Invalid property edit '{edit}', expected KEY=VALUE")]
    InvalidEdit { edit: String },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Simulate {
            scenario_path,
            setpoint,
            t_end,
            output,
        } => cmd_simulate(&scenario_path, setpoint, t_end, output.as_deref()),
        Commands::Inspect {
            scenario_path,
            edits,
        } => cmd_inspect(&scenario_path, &edits),
    }
}

fn cmd_validate(scenario_path: &Path) -> CliResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let scenario = load_yaml(scenario_path)?;
    println!("✓ Scenario '{}' is valid", scenario.name);
    Ok(())
}

fn cmd_simulate(
    scenario_path: &Path,
    setpoint: Option<f64>,
    t_end: Option<f64>,
    output: Option<&Path>,
) -> CliResult<()> {
    let mut scenario = load_yaml(scenario_path)?;
    if let Some(setpoint) = setpoint {
        scenario.setpoint = setpoint;
    }
    if let Some(t_end) = t_end {
        scenario.options.t_end = t_end;
    }

    println!("Simulating '{}'", scenario.name);
    println!(
        "  setpoint = {:.4}, dt = {:.4} s, control period = {:.4} s, t_end = {:.3} s",
        scenario.setpoint,
        scenario.options.dt,
        scenario.options.control_period,
        scenario.options.t_end
    );

    let started = Instant::now();
    let trace = run_closed_loop(&scenario)?;
    let elapsed = started.elapsed();

    println!("✓ Simulation completed in {:.3} s", elapsed.as_secs_f64());
    println!("  Control cycles: {}", trace.cycles);
    println!("  Final position: {:.4}", trace.final_position);
    println!("  Final velocity: {:.4}", trace.final_velocity);
    match trace.settled_at {
        Some(t) => println!("  Settled at:     {t:.3} s"),
        None => println!("  Settled at:     never"),
    }

    if let Some(path) = output {
        trace.write_csv(path)?;
        println!(
            "✓ Wrote {} samples to {}",
            trace.samples.len(),
            path.display()
        );
    }
    Ok(())
}

fn cmd_inspect(scenario_path: &Path, edits: &[String]) -> CliResult<()> {
    let scenario = load_yaml(scenario_path)?;
    let mut pid = build_loop(&scenario);

    for edit in edits {
        let (key, value) = parse_edit(edit)?;
        pid.set_property(key, value)?;
    }

    println!("{}", pid.snapshot().to_json_pretty()?);
    Ok(())
}

fn build_loop(scenario: &ScenarioConfig) -> ControlLoop<SharedSignal> {
    let feedback = SharedSignal::new(scenario.plant.initial_position);
    let mut pid = ControlLoop::new(scenario.name.as_str(), scenario.control, feedback)
        .with_notifier(|| tracing::info!("tuning changed"));
    if let Some(subsystem) = &scenario.subsystem {
        pid.set_subsystem(subsystem.as_str());
    }
    pid.set_setpoint(scenario.setpoint);
    pid.set_enabled(scenario.enabled);
    pid
}

fn parse_edit(edit: &str) -> CliResult<(&str, PropertyValue)> {
    let invalid = || CliError::InvalidEdit {
        edit: edit.to_string(),
    };
    let (key, raw) = edit.split_once('=').ok_or_else(invalid)?;
    let value = match raw.trim() {
        "true" => PropertyValue::Bool(true),
        "false" => PropertyValue::Bool(false),
        number => PropertyValue::Number(number.parse().map_err(|_| invalid())?),
    };
    Ok((key.trim(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_and_boolean_edits() {
        let (key, value) = parse_edit("p=0.25").unwrap();
        assert_eq!(key, "p");
        assert_eq!(value, PropertyValue::Number(0.25));

        let (key, value) = parse_edit(" enabled = false ").unwrap();
        assert_eq!(key, "enabled");
        assert_eq!(value, PropertyValue::Bool(false));
    }

    #[test]
    fn rejects_malformed_edits() {
        assert!(matches!(
            parse_edit("p"),
            Err(CliError::InvalidEdit { .. })
        ));
        assert!(matches!(
            parse_edit("p=fast"),
            Err(CliError::InvalidEdit { .. })
        ));
    }

    #[test]
    fn built_loop_reflects_scenario() {
        let scenario = ScenarioConfig::from_yaml_str(
            "name: lift\nsetpoint: 2.0\nenabled: false\ncontrol:\n  gains: { kp: 0.4 }\n",
        )
        .unwrap();
        let mut pid = build_loop(&scenario);
        assert_eq!(pid.setpoint(), 2.0);
        assert!(!pid.is_enabled());

        pid.set_property("p", PropertyValue::Number(0.6)).unwrap();
        let snapshot = pid.snapshot();
        assert_eq!(snapshot.name, "lift");
        assert_eq!(snapshot.get("p"), Some(PropertyValue::Number(0.6)));
        assert_eq!(snapshot.get("enabled"), Some(PropertyValue::Bool(false)));
    }
}
