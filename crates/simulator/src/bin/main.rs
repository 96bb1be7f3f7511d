//! Raid Simulator CLI
//!
//! Run a scenario file for many iterations and report damage statistics.
//!
//! # Example
//!
//! ```bash
//! # Reproducible run on four threads
//! raidsim scenarios/warlock.toml --seed 42 --threads 4
//!
//! # Override the scenario's iteration count and scheduler, write JSON
//! raidsim scenarios/warlock.toml -i 10000 --scheduler heap --output report.json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use raidsim_core::SchedulerKind;
use raidsim_simulation::run_parallel;
use raidsim_simulator::{RunSummary, Scenario};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Raid Simulator
///
/// Runs a combat scenario for many independent iterations. Results are
/// reproducible for a given seed, scheduler and thread count.
#[derive(Parser, Debug)]
#[command(name = "raidsim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Scenario file (TOML)
    scenario: PathBuf,

    /// Number of iterations, overriding the scenario
    #[arg(short = 'i', long)]
    iterations: Option<u64>,

    /// Random seed for reproducible results. When omitted, the scenario's seed
    /// is used, or a random one if it has none.
    #[arg(long)]
    seed: Option<u64>,

    /// Event scheduler: list, priorityq or wheel
    #[arg(long)]
    scheduler: Option<SchedulerKind>,

    /// Worker threads
    #[arg(short = 't', long, default_value = "1")]
    threads: usize,

    /// Write the JSON summary to this file
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Print the JSON summary to stdout instead of the text report
    #[arg(long)]
    json: bool,

    /// Log per-action resolution (debug level)
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let scenario = Scenario::load(&args.scenario)?;
    let (mut config, roster) = scenario
        .resolve()
        .with_context(|| format!("Invalid scenario: {}", args.scenario.display()))?;

    config.seed = args
        .seed
        .or(scenario.sim.seed)
        .unwrap_or_else(rand::random);
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }
    if let Some(scheduler) = args.scheduler {
        config.scheduler = scheduler;
    }

    info!(
        scenario = %args.scenario.display(),
        iterations = config.iterations,
        seed = config.seed,
        scheduler = %config.scheduler,
        threads = args.threads,
        "Starting simulation"
    );

    let started = Instant::now();
    let report = run_parallel(&config, args.threads, |config| roster.build(config))
        .context("Simulation failed")?;
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        events = report.events_processed,
        "Simulation finished"
    );

    for (iteration, anomaly) in report.anomalies() {
        warn!(iteration, ?anomaly, "Iteration stopped early");
    }

    let summary = RunSummary::new(config.seed, &report);
    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write summary: {}", path.display()))?;
        info!(path = %path.display(), "Summary written");
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        summary.print_summary();
    }
    Ok(())
}
