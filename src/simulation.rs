use crate::grid::compute_infection_pressure;
use crate::grid_state::GridState;
use crate::integrator::{euler_step, StepRates};
use crate::normalizer::normalize;
use anyhow::Result;
use epigrid_common::{Compartment, SimParams, SimulationConfig, Snapshot};
use log::{debug, warn};
use rand::prelude::*;

/// Owns the lattice and runs the spatial SIR model one explicit step at a time.
pub struct SimulationController {
    /// The simulation configuration the controller was built from.
    config: SimulationConfig,
    /// Runtime parameters. `beta` and `gamma` change through the setters.
    params: SimParams,
    /// Current lattice.
    grid: GridState,
    /// RNG used for initial seeding and resets. Stepping never draws from it.
    rng: StdRng,
    /// Scratch buffer for the neighbourhood-averaged infected fraction.
    infection_pressure: Vec<f32>,
}

impl SimulationController {
    /// Creates a controller and seeds its lattice from the configured RNG seed.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.initial_conditions.seed);
        let params = config.get_sim_params();
        let grid = GridState::initialize(
            params.grid_height,
            params.grid_width,
            params.infected_seed_ratio,
            &mut rng,
        )?;
        Ok(Self::assemble(config, params, grid, rng))
    }

    /// Creates a controller around a prepared lattice, e.g. a hand-built scenario.
    /// The lattice must match the configured dimensions.
    pub fn with_grid(config: SimulationConfig, grid: GridState) -> Result<Self> {
        config.validate()?;
        if grid.height() != config.grid.height || grid.width() != config.grid.width {
            anyhow::bail!(
                "grid is {}x{} but configuration expects {}x{}.",
                grid.height(),
                grid.width(),
                config.grid.height,
                config.grid.width
            );
        }
        let rng = StdRng::seed_from_u64(config.initial_conditions.seed);
        let params = config.get_sim_params();
        Ok(Self::assemble(config, params, grid, rng))
    }

    fn assemble(config: SimulationConfig, params: SimParams, grid: GridState, rng: StdRng) -> Self {
        let num_cells = grid.num_cells();
        Self {
            config,
            params,
            grid,
            rng,
            infection_pressure: vec![0.0; num_cells],
        }
    }

    /// Advances the lattice by one time step `dt`.
    pub fn step(&mut self) {
        // Parameters are read once, up front.
        let rates = StepRates {
            beta: self.params.beta,
            gamma: self.params.gamma,
            dt: self.params.dt,
        };

        // --- 1. Local infection pressure ---
        compute_infection_pressure(
            self.grid.infected(),
            self.grid.height(),
            self.grid.width(),
            &mut self.infection_pressure,
        );

        // --- 2. Explicit Euler update ---
        euler_step(&mut self.grid, &self.infection_pressure, rates);

        // --- 3. Clip and renormalise ---
        let degenerate = normalize(&mut self.grid);
        if degenerate > 0 {
            debug!(
                "Step {}: {} cell(s) had zero total and were reset to the recovered baseline.",
                self.params.time_step + 1,
                degenerate
            );
        }

        self.params.time_step += 1;
    }

    /// Re-seeds the lattice with the configured dimensions and seed ratio.
    /// Draws continue from the controller's RNG, so each reset gives a new layout.
    pub fn reset(&mut self) -> Result<()> {
        self.grid = GridState::initialize(
            self.params.grid_height,
            self.params.grid_width,
            self.params.infected_seed_ratio,
            &mut self.rng,
        )?;
        self.params.time_step = 0;
        debug!("Lattice reset ({}x{}).", self.params.grid_height, self.params.grid_width);
        Ok(())
    }

    /// Sets the infection rate used from the next step on. Any value is accepted.
    pub fn set_beta(&mut self, beta: f32) {
        if !(0.0..=1.0).contains(&beta) {
            warn!("beta set to {} (outside [0, 1]).", beta);
        }
        self.params.beta = beta;
    }

    /// Sets the recovery rate used from the next step on. Any value is accepted.
    pub fn set_gamma(&mut self, gamma: f32) {
        if !(0.0..=1.0).contains(&gamma) {
            warn!("gamma set to {} (outside [0, 1]).", gamma);
        }
        self.params.gamma = gamma;
    }

    pub fn beta(&self) -> f32 {
        self.params.beta
    }

    pub fn gamma(&self) -> f32 {
        self.params.gamma
    }

    pub fn dt(&self) -> f32 {
        self.params.dt
    }

    /// Number of steps since construction or the last reset.
    pub fn current_step(&self) -> u32 {
        self.params.time_step
    }

    pub fn elapsed_time(&self) -> f32 {
        self.params.elapsed_time()
    }

    /// Read-only view of the lattice.
    pub fn grid(&self) -> &GridState {
        &self.grid
    }

    /// Dominant compartment of every cell, row-major.
    pub fn dominant_labels(&self) -> Vec<Compartment> {
        self.grid.dominant_labels()
    }

    /// Spatial mean of (S, I, R).
    pub fn means(&self) -> (f32, f32, f32) {
        self.grid.means()
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Captures the current aggregates. Per-cell labels are included on request.
    pub fn snapshot(&self, include_labels: bool) -> Snapshot {
        let (mean_susceptible, mean_infected, mean_recovered) = self.means();
        Snapshot {
            step: self.params.time_step,
            time: self.elapsed_time(),
            beta: self.params.beta,
            gamma: self.params.gamma,
            mean_susceptible,
            mean_infected,
            mean_recovered,
            dominant_counts: self.grid.dominant_counts(),
            labels: include_labels.then(|| self.dominant_labels()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(height: usize, width: usize) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.grid.height = height;
        config.grid.width = width;
        config
    }

    fn two_by_two_scenario() -> SimulationController {
        let mut grid = GridState::from_channels(2, 2, vec![1.0; 4], vec![0.0; 4], vec![0.0; 4]).unwrap();
        grid.set_cell(0, 0, 0.0, 1.0, 0.0);
        SimulationController::with_grid(config(2, 2), grid).unwrap()
    }

    #[test]
    fn two_by_two_scenario_spreads_and_recovers() {
        let mut sim = two_by_two_scenario();
        assert!((sim.beta() - 0.35).abs() < 1e-7);
        assert!((sim.gamma() - 0.10).abs() < 1e-7);
        assert!((sim.dt() - 0.2).abs() < 1e-7);

        sim.step();
        let grid = sim.grid();

        // The source has no infected neighbours and only recovers.
        let (s00, i00, r00) = grid.cell(0, 0);
        assert_eq!(s00, 0.0);
        assert!((i00 - 0.98).abs() < 1e-6);
        assert!((r00 - 0.02).abs() < 1e-6);

        // (0,1) and (1,0) see the source twice among 8 wrapped offsets, (1,1) four times.
        let (_, i01, _) = grid.cell(0, 1);
        let (_, i10, _) = grid.cell(1, 0);
        let (_, i11, _) = grid.cell(1, 1);
        assert!((i01 - 0.2 * 0.35 * 0.25).abs() < 1e-6);
        assert!((i10 - 0.2 * 0.35 * 0.25).abs() < 1e-6);
        assert!((i11 - 0.2 * 0.35 * 0.5).abs() < 1e-6);

        assert!(grid.is_valid(1e-6));
        assert_eq!(sim.current_step(), 1);
    }

    #[test]
    fn invariant_holds_over_many_steps() {
        let mut cfg = config(24, 24);
        cfg.initial_conditions.infected_seed_ratio = 0.2;
        let mut sim = SimulationController::new(cfg).unwrap();
        for _ in 0..200 {
            sim.step();
            assert!(sim.grid().is_valid(1e-6), "step {}", sim.current_step());
        }
    }

    #[test]
    fn invariant_holds_with_aggressive_rates() {
        let mut cfg = config(16, 16);
        cfg.initial_conditions.infected_seed_ratio = 0.5;
        cfg.timing.dt = 3.0;
        let mut sim = SimulationController::new(cfg).unwrap();
        sim.set_beta(5.0);
        sim.set_gamma(2.0);
        for _ in 0..50 {
            sim.step();
            assert!(sim.grid().is_valid(1e-6));
        }
    }

    #[test]
    fn stepping_is_deterministic() {
        let mut cfg = config(20, 30);
        cfg.initial_conditions.infected_seed_ratio = 0.1;
        let mut a = SimulationController::new(cfg.clone()).unwrap();
        let mut b = SimulationController::new(cfg).unwrap();
        assert_eq!(a.grid(), b.grid());
        for _ in 0..100 {
            a.step();
            b.step();
        }
        assert_eq!(a.grid(), b.grid());
    }

    #[test]
    fn zero_beta_freezes_susceptibles() {
        let mut cfg = config(10, 10);
        cfg.initial_conditions.infected_seed_ratio = 0.3;
        cfg.epidemic.beta = 0.0;
        let mut sim = SimulationController::new(cfg).unwrap();
        for _ in 0..20 {
            let before = sim.grid().clone();
            sim.step();
            let after = sim.grid();
            for idx in 0..after.num_cells() {
                assert!((after.susceptible()[idx] - before.susceptible()[idx]).abs() < 1e-6);
                assert!(after.infected()[idx] <= before.infected()[idx] + 1e-7);
                assert!(after.recovered()[idx] >= before.recovered()[idx] - 1e-7);
            }
        }
    }

    #[test]
    fn parameter_changes_apply_from_next_step() {
        let mut sim = two_by_two_scenario();
        sim.set_beta(0.0);
        sim.set_gamma(0.5);
        sim.step();
        let (_, i01, _) = sim.grid().cell(0, 1);
        let (_, i00, r00) = sim.grid().cell(0, 0);
        assert_eq!(i01, 0.0);
        assert!((i00 - 0.9).abs() < 1e-6);
        assert!((r00 - 0.1).abs() < 1e-6);
        assert_eq!(sim.params().beta, 0.0);
    }

    #[test]
    fn reset_restores_seeded_profile() {
        let mut cfg = config(60, 60);
        cfg.initial_conditions.infected_seed_ratio = 0.04;
        let mut sim = SimulationController::new(cfg).unwrap();
        let first = sim.grid().clone();
        for _ in 0..30 {
            sim.step();
        }
        sim.reset().unwrap();

        assert_eq!(sim.current_step(), 0);
        assert!(sim.grid().is_valid(1e-6));
        assert_ne!(sim.grid(), &first);
        let (mean_s, mean_i, mean_r) = sim.means();
        assert!((mean_i - 0.04).abs() < 0.02, "mean infected {}", mean_i);
        assert!((mean_s + mean_i - 1.0).abs() < 1e-6);
        assert_eq!(mean_r, 0.0);
    }

    #[test]
    fn with_grid_rejects_mismatched_dimensions() {
        let grid = GridState::from_channels(3, 3, vec![1.0; 9], vec![0.0; 9], vec![0.0; 9]).unwrap();
        assert!(SimulationController::with_grid(config(4, 4), grid).is_err());
    }

    #[test]
    fn new_rejects_invalid_configuration() {
        assert!(SimulationController::new(config(0, 5)).is_err());
        let mut cfg = config(5, 5);
        cfg.timing.dt = f32::NAN;
        assert!(SimulationController::new(cfg).is_err());
    }

    #[test]
    fn snapshot_reports_current_aggregates() {
        let mut sim = two_by_two_scenario();
        sim.step();
        let snap = sim.snapshot(true);
        assert_eq!(snap.step, 1);
        assert!((snap.time - 0.2).abs() < 1e-6);
        let (s, i, r) = sim.means();
        assert_eq!(snap.means(), (s, i, r));
        assert!((s + i + r - 1.0).abs() < 1e-6);
        assert_eq!(snap.dominant_counts.iter().sum::<u32>(), 4);
        assert_eq!(snap.labels.as_ref().map(|l| l.len()), Some(4));
        assert!(sim.snapshot(false).labels.is_none());
    }
}
