use std::path::PathBuf;

use busters_core::belief::TrackerConfig;
use clap::Parser;

use busters_bench::config::{BenchmarkConfig, ResolvedOutputs};
use busters_bench::logging::init_logging;
use busters_bench::simulation::SimulationRunner;

/// Benchmarking harness for ghost-tracking inference.
#[derive(Debug, Parser)]
#[command(
    name = "busters-bench",
    author,
    version,
    about = "Deterministic ghost-tracking benchmark"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of episodes to simulate.
    #[arg(long, value_name = "EPISODES")]
    episodes: Option<usize>,

    /// Override the number of steps per episode.
    #[arg(long, value_name = "STEPS")]
    steps: Option<usize>,

    /// Override the RNG seed for the episode stream.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Exit after validating the configuration (no episode is run).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(episodes) = cli.episodes {
        config.scenario.episodes = episodes;
    }

    if let Some(steps) = cli.steps {
        config.scenario.steps = steps;
    }

    if let Some(seed) = cli.seed {
        config.scenario.seed = Some(seed);
    }

    config.apply_tracker_defaults(TrackerConfig::from_env());

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let tracker_count = config.trackers.len();
    let ghost_count = config.scenario.ghosts.len();
    let run_id = config.run_id.clone();
    let episodes = config.scenario.episodes;
    let steps = config.scenario.steps;

    println!(
        "Loaded configuration '{run_id}' with {tracker_count} tracker{} and {ghost_count} ghost{} ({episodes} episodes, {steps} steps)",
        if tracker_count == 1 { "" } else { "s" },
        if ghost_count == 1 { "" } else { "s" }
    );

    let runner = SimulationRunner::new(config.clone(), outputs.clone())?;

    if cli.validate_only {
        println!("Validation-only mode: simulation skipped.");
        return Ok(());
    }

    let _logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let summary = runner.run()?;
    println!(
        "Run complete for '{run_id}': {} episodes × {} steps → {} rows at {}",
        summary.episodes,
        summary.steps,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(plot_path) = summary.plot_path.as_ref() {
        println!("Hit-rate plot: {}", plot_path.display());
    }
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}
