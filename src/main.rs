use anyhow::Result;
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::time::Instant;

use epigrid_common::SimulationConfig;
use epigrid_engine::ensemble::{run_ensemble, summarize};
use epigrid_engine::output::{
    final_grid_path, save_final_grid, save_snapshots, save_summary, snapshot_path, summary_path, OutputFormat,
};
use epigrid_engine::runner::{run_simulation, RunOutcome};

/// Headless driver for the spatial SIR lattice engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override timing.total_steps
    #[arg(long)]
    steps: Option<u32>,

    /// Override ensemble.replicates
    #[arg(long)]
    replicates: Option<u32>,

    /// Override initial_conditions.seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    info!("Starting epigrid engine...");

    // --- Load Configuration ---
    let mut config = SimulationConfig::load(&args.config)?;
    if let Some(steps) = args.steps {
        config.timing.total_steps = steps;
    }
    if let Some(replicates) = args.replicates {
        config.ensemble.replicates = replicates;
    }
    if let Some(seed) = args.seed {
        config.initial_conditions.seed = seed;
    }
    config.validate()?;

    // --- Run ---
    let start_time = Instant::now();
    let outcomes = if config.ensemble.replicates > 1 {
        run_ensemble(&config)?
    } else {
        vec![run_simulation(config.clone(), 0)?]
    };
    info!("All runs finished in {:.3} seconds.", start_time.elapsed().as_secs_f64());

    for outcome in &outcomes {
        info!(
            "Replicate {} (seed {}): final S {:.4} I {:.4} R {:.4} | peak I {:.4} at step {}",
            outcome.replicate,
            outcome.seed,
            outcome.final_means.0,
            outcome.final_means.1,
            outcome.final_means.2,
            outcome.peak_infected,
            outcome.peak_step
        );
    }
    let summary = if outcomes.len() > 1 { summarize(&outcomes) } else { None };
    if let Some(summary) = &summary {
        info!(
            "Ensemble of {}: peak I mean {:.4} (min {:.4}, max {:.4}) | final R mean {:.4}",
            summary.replicates,
            summary.mean_peak_infected,
            summary.min_peak_infected,
            summary.max_peak_infected,
            summary.mean_final_recovered
        );
    }

    // --- Save Recorded Data ---
    info!("Saving recorded data...");
    let format = OutputFormat::from_config(config.output.format.as_deref());
    for outcome in &outcomes {
        save_outcome(&config, outcome, format, outcomes.len() > 1);
    }
    if let Some(summary) = &summary {
        let path = summary_path(&config.output.base_filename);
        if let Err(e) = save_summary(summary, &path) {
            error!("{:#}", e);
        }
    }

    info!("Simulation Complete.");
    Ok(())
}

/// Writes one run's outputs. Failures are logged and do not abort the other runs.
fn save_outcome(config: &SimulationConfig, outcome: &RunOutcome, format: OutputFormat, is_ensemble: bool) {
    let suffix = if is_ensemble { format!("_rep{}", outcome.replicate) } else { String::new() };
    let base = &config.output.base_filename;

    if config.output.save_stats {
        let path = snapshot_path(base, &suffix, format);
        if let Err(e) = save_snapshots(&outcome.snapshots, &path, format) {
            error!("{:#}", e);
        }
    } else {
        info!("Skipping saving snapshots as per config (save_stats is false).");
    }

    if config.output.save_final_grid {
        let path = final_grid_path(base, &suffix);
        if let Err(e) = save_final_grid(&outcome.final_grid, &path) {
            error!("{:#}", e);
        }
    } else {
        info!("Skipping saving final grid as per config.");
    }
}
