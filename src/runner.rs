use crate::grid_state::GridState;
use crate::history::MeansHistory;
use crate::simulation::SimulationController;
use anyhow::Result;
use epigrid_common::{SimulationConfig, Snapshot};
use log::{debug, info, trace};
use std::time::Instant;

/// Wall-clock interval between unsolicited status lines.
const STATUS_INTERVAL_SECS: f64 = 5.0;

/// Everything a finished run hands back to the driver.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub replicate: u32,
    pub seed: u64,
    pub snapshots: Vec<Snapshot>,
    pub final_grid: GridState,
    pub final_means: (f32, f32, f32),
    /// Highest mean infected fraction seen at any step, and the loop step it occurred at.
    pub peak_infected: f32,
    pub peak_step: u32,
}

/// Runs one simulation for `config.timing.total_steps` steps, applying scheduled
/// parameter changes and recording snapshots along the way.
pub fn run_simulation(config: SimulationConfig, replicate: u32) -> Result<RunOutcome> {
    let seed = config.initial_conditions.seed;
    let total_steps = config.timing.total_steps;
    let record_interval_steps = config.timing.record_interval_steps.max(1);
    let include_labels = config.output.save_labels_in_snapshot;
    let mut history = MeansHistory::new(config.output.history_window);

    let mut sim = SimulationController::new(config)?;
    debug!("[rep {}] Simulation parameters: {:#?}", replicate, sim.params());
    info!(
        "[rep {}] {}x{} lattice, seed {}, R0 (well-mixed) = {:.2}. Running {} steps, recording every {}.",
        replicate,
        sim.params().grid_height,
        sim.params().grid_width,
        seed,
        sim.params().r0(),
        total_steps,
        record_interval_steps
    );

    // --- Initial Snapshot (step 0) ---
    let mut snapshots = vec![sim.snapshot(include_labels)];
    let initial_means = sim.means();
    history.push(initial_means);
    let mut peak_infected = initial_means.1;
    let mut peak_step = 0;

    let start_time = Instant::now();
    let mut previous_print_time = start_time;

    for step in 0..total_steps {
        // --- Scripted parameter changes for this step ---
        let changes: Vec<_> = sim.config().changes_at(step).cloned().collect();
        for change in changes {
            if change.reset {
                sim.reset()?;
                history.clear();
                info!("[rep {}] Lattice reset before step {}.", replicate, step + 1);
            }
            if let Some(beta) = change.beta {
                sim.set_beta(beta);
                info!("[rep {}] beta -> {:.3} before step {}.", replicate, beta, step + 1);
            }
            if let Some(gamma) = change.gamma {
                sim.set_gamma(gamma);
                info!("[rep {}] gamma -> {:.3} before step {}.", replicate, gamma, step + 1);
            }
        }

        let step_start_time = Instant::now();
        sim.step();
        let step_duration = step_start_time.elapsed();

        let means = sim.means();
        history.push(means);
        if means.1 > peak_infected {
            peak_infected = means.1;
            peak_step = step + 1;
        }

        let current_time = Instant::now();
        let should_print_status =
            current_time.duration_since(previous_print_time).as_secs_f64() >= STATUS_INTERVAL_SECS;
        let is_record_step = (step + 1) % record_interval_steps == 0;
        let is_last_step = step + 1 == total_steps;

        if is_record_step || is_last_step {
            snapshots.push(sim.snapshot(include_labels));
        }

        if should_print_status || is_last_step {
            info!(
                "[rep {}] Step [{}/{}] ({:.2}) | S {:.4} I {:.4} R {:.4} | window peak I {:.4} | Elapsed: {:.2} s",
                replicate,
                step + 1,
                total_steps,
                sim.elapsed_time(),
                means.0,
                means.1,
                means.2,
                history.peak_infected().unwrap_or(means.1),
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = current_time;
        } else {
            trace!(
                "[rep {}] Step [{}/{}] completed in {:.3} ms | I {:.4}",
                replicate,
                step + 1,
                total_steps,
                step_duration.as_secs_f64() * 1000.0,
                means.1
            );
        }
    }

    info!(
        "[rep {}] Finished {} steps in {:.3} seconds.",
        replicate,
        total_steps,
        start_time.elapsed().as_secs_f64()
    );

    Ok(RunOutcome {
        replicate,
        seed,
        snapshots,
        final_means: sim.means(),
        final_grid: sim.grid().clone(),
        peak_infected,
        peak_step,
    })
}
