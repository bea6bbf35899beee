use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tn_core::kelvin_to_celsius;
use tn_project::{
    MINIMAL_SIGNAL, MinimalParams, PreparedScenario, ProjectError, ProjectResult,
    ResidentialParams, STORAGE_SIGNAL, Scenario,
};
use tn_sim::{Method, RunSummary, SimError, Solver};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tn-cli")]
#[command(about = "thermonet CLI - lumped thermal network simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a scenario file and the network it describes
    Validate {
        /// Path to the scenario file (YAML or JSON)
        scenario_path: PathBuf,
    },
    /// Run a scenario file
    Run {
        /// Path to the scenario file (YAML or JSON)
        scenario_path: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Run the single heated mass and compare with the no-loss prediction
    Minimal {
        #[command(flatten)]
        run: RunArgs,
        /// Also write the scenario to this path (`.json` or YAML)
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Run the solar thermal store over one day
    Residential {
        #[command(flatten)]
        run: RunArgs,
        /// Also write the scenario to this path (`.json` or YAML)
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Integration method (dormand-prince, trapezoidal); overrides the scenario
    #[arg(long)]
    method: Option<Method>,
    /// Signal to print and export (defaults to the first registered)
    #[arg(long)]
    signal: Option<String>,
    /// Write the selected signal as CSV to this path (`-` for stdout)
    #[arg(long)]
    export: Option<PathBuf>,
}

fn main() -> ProjectResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Run { scenario_path, run } => {
            let scenario = tn_project::load(&scenario_path)?;
            run_scenario(&scenario, &run).map(|_| ())
        }
        Commands::Minimal { run, save } => cmd_minimal(&run, save.as_deref()),
        Commands::Residential { run, save } => cmd_residential(&run, save.as_deref()),
    }
}

fn cmd_validate(scenario_path: &Path) -> ProjectResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let scenario = tn_project::load(scenario_path)?;
    let network = scenario.build_network()?;
    scenario.build_log(&network)?;
    println!(
        "✓ Scenario '{}' is valid ({} nodes, {} links, {} sources, {} signals)",
        scenario.name,
        network.nodes().len(),
        network.links().len(),
        network.sources().len(),
        scenario.signals.len()
    );
    Ok(())
}

fn cmd_minimal(run: &RunArgs, save: Option<&Path>) -> ProjectResult<()> {
    let params = MinimalParams::default();
    let scenario = params.scenario();
    save_scenario(&scenario, save)?;
    let prepared = run_scenario(&scenario, run)?;

    let prediction = params.prediction();
    let signal = prepared.log.get(MINIMAL_SIGNAL)?;
    if let Some((_, final_k)) = signal.last() {
        println!("\nNo-loss check:");
        println!(
            "  Predicted: {:.4} °C  ({:.4} K/min)",
            kelvin_to_celsius(prediction.final_temperature_k),
            prediction.rise_rate_k_per_min()
        );
        println!(
            "  Simulated: {:.4} °C  (error {:.2e} K)",
            kelvin_to_celsius(final_k),
            final_k - prediction.final_temperature_k
        );
    }
    Ok(())
}

fn cmd_residential(run: &RunArgs, save: Option<&Path>) -> ProjectResult<()> {
    let params = ResidentialParams::default();
    let scenario = params.scenario();
    save_scenario(&scenario, save)?;
    let prepared = run_scenario(&scenario, run)?;

    let bound = params.no_loss_bound();
    let signal = prepared.log.get(STORAGE_SIGNAL)?;
    if let Some((_, final_k)) = signal.last() {
        println!("\nStorage after {:.0} h:", params.duration_s / 3600.0);
        println!("  Simulated:     {:.3} °C", kelvin_to_celsius(final_k));
        println!(
            "  No-loss bound: {:.3} °C",
            kelvin_to_celsius(bound.final_temperature_k)
        );
        println!(
            "  Heat input {:.0} W, exchanger {:.0} W/K",
            params.delivered_power_w(),
            params.conductance_w_per_k()
        );
    }
    Ok(())
}

fn save_scenario(scenario: &Scenario, path: Option<&Path>) -> ProjectResult<()> {
    if let Some(path) = path {
        tn_project::save(path, scenario)?;
        info!(scenario = %scenario.name, path = %path.display(), "scenario saved");
        println!("✓ Saved scenario '{}' to {}", scenario.name, path.display());
    }
    Ok(())
}

fn run_scenario(scenario: &Scenario, run: &RunArgs) -> ProjectResult<PreparedScenario> {
    let mut prepared = scenario.prepare()?;
    if let Some(method) = run.method {
        prepared.options.method = method;
    }
    info!(
        scenario = %prepared.name,
        nodes = prepared.network.node_count(),
        links = prepared.network.links().len(),
        sources = prepared.network.sources().len(),
        signals = prepared.log.names().count(),
        "scenario prepared"
    );
    println!(
        "Running '{}' with {} over {:.0} s",
        prepared.name, prepared.options.method, prepared.options.t_stop
    );

    let started = Instant::now();
    let mut solver = Solver::new(&prepared.network, prepared.options.clone())?;
    let summary = match solver.run(&mut prepared.log) {
        Ok(summary) => summary,
        Err(err) => {
            error!(scenario = %prepared.name, error = %err, "run failed");
            if let SimError::IntegrationDiverged {
                time,
                state,
                reason,
            } = &err
            {
                eprintln!("✗ Integration diverged at t = {time:.3} s: {reason}");
                for node in prepared.network.nodes() {
                    if let Some(&t) = state.get(node.id.index()) {
                        eprintln!("    {:<16} {:>10.3} °C", node.name, kelvin_to_celsius(t));
                    }
                }
            }
            return Err(err.into());
        }
    };
    let elapsed_s = started.elapsed().as_secs_f64();
    info!(scenario = %prepared.name, elapsed_s, "run finished");
    println!("✓ Completed in {elapsed_s:.3} s");
    print_summary(&summary);

    let selected = match &run.signal {
        Some(name) => Some(name.clone()),
        None => prepared.log.names().next().map(str::to_string),
    };
    if let Some(name) = selected {
        let signal = prepared.log.get(&name)?;
        println!("\nSignal '{}': {} points", name, signal.len());
        if let Some((t, v)) = signal.last() {
            println!("  last: t = {t:.1} s, value = {v:.6}");
        }
        if let Some(path) = &run.export {
            export_csv(&prepared, &name, path)?;
        }
    } else if run.export.is_some() {
        eprintln!("Nothing to export: scenario registers no signals");
    }

    Ok(prepared)
}

fn print_summary(summary: &RunSummary) {
    let stats = &summary.stats;
    println!("\nSolver summary ({}):", summary.method);
    println!("  Accepted steps:   {}", stats.accepted_steps);
    println!("  Rejected steps:   {}", stats.rejected_steps);
    println!("  RHS evaluations:  {}", stats.rhs_evaluations);
    if summary.method.is_implicit() {
        println!("  Jacobians:        {}", stats.jacobian_evaluations);
    }
    println!("\nFinal temperatures:");
    for (name, t) in &summary.final_temperatures_k {
        println!("  {:<16} {:>10.3} °C", name, kelvin_to_celsius(*t));
    }
}

/// `-` writes to stdout.
fn export_csv(prepared: &PreparedScenario, name: &str, path: &Path) -> ProjectResult<()> {
    if path == Path::new("-") {
        prepared.log.write_csv(name, io::stdout().lock())?;
        return Ok(());
    }
    let file = File::create(path).map_err(ProjectError::Io)?;
    prepared.log.write_csv(name, BufWriter::new(file))?;
    println!("✓ Exported '{}' to {}", name, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_options() {
        let cli = Cli::try_parse_from([
            "tn-cli",
            "run",
            "house.yaml",
            "--method",
            "trapezoidal",
            "--signal",
            "living_c",
            "--export",
            "-",
        ])
        .unwrap();
        match cli.command {
            Commands::Run { scenario_path, run } => {
                assert_eq!(scenario_path, PathBuf::from("house.yaml"));
                assert_eq!(run.method, Some(Method::Trapezoidal));
                assert_eq!(run.signal.as_deref(), Some("living_c"));
                assert_eq!(run.export, Some(PathBuf::from("-")));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn parses_reference_save_path() {
        let cli = Cli::try_parse_from(["tn-cli", "residential", "--save", "store.json"]).unwrap();
        match cli.command {
            Commands::Residential { run, save } => {
                assert_eq!(save, Some(PathBuf::from("store.json")));
                assert!(run.method.is_none());
            }
            _ => panic!("expected residential"),
        }
    }

    #[test]
    fn rejects_unknown_method() {
        assert!(Cli::try_parse_from(["tn-cli", "minimal", "--method", "euler"]).is_err());
    }
}
