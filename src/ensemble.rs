use crate::runner::{run_simulation, RunOutcome};
use anyhow::{Context, Result};
use epigrid_common::SimulationConfig;
use log::info;
use rayon::prelude::*;
use serde::Serialize;

/// Seed for replicate `index`, derived from the configured base seed.
pub fn replicate_seed(base_seed: u64, index: u32) -> u64 {
    base_seed.wrapping_add(index as u64)
}

/// Runs `config.ensemble.replicates` independent simulations in parallel.
/// Each replicate owns its controller; only the replicates run concurrently.
/// Outcomes are returned in replicate order.
pub fn run_ensemble(config: &SimulationConfig) -> Result<Vec<RunOutcome>> {
    let replicates = config.ensemble.replicates;
    let base_seed = config.initial_conditions.seed;
    info!(
        "Running {} replicates on {} Rayon threads (base seed {}).",
        replicates,
        rayon::current_num_threads(),
        base_seed
    );

    (0..replicates)
        .into_par_iter()
        .map(|index| {
            let mut replicate_config = config.clone();
            replicate_config.initial_conditions.seed = replicate_seed(base_seed, index);
            run_simulation(replicate_config, index)
                .with_context(|| format!("Replicate {} failed", index))
        })
        .collect()
}

/// Summary statistics over a finished ensemble.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsembleSummary {
    pub replicates: usize,
    pub seeds: Vec<u64>,
    pub mean_peak_infected: f32,
    pub min_peak_infected: f32,
    pub max_peak_infected: f32,
    pub mean_final_recovered: f32,
}

pub fn summarize(outcomes: &[RunOutcome]) -> Option<EnsembleSummary> {
    if outcomes.is_empty() {
        return None;
    }
    let n = outcomes.len() as f32;
    let peaks = outcomes.iter().map(|o| o.peak_infected);
    Some(EnsembleSummary {
        replicates: outcomes.len(),
        seeds: outcomes.iter().map(|o| o.seed).collect(),
        mean_peak_infected: peaks.clone().sum::<f32>() / n,
        min_peak_infected: peaks.clone().fold(f32::INFINITY, f32::min),
        max_peak_infected: peaks.fold(f32::NEG_INFINITY, f32::max),
        mean_final_recovered: outcomes.iter().map(|o| o.final_means.2).sum::<f32>() / n,
    })
}
