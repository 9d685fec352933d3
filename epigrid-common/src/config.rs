use serde::{Deserialize, Serialize};
use anyhow::{Context, Result};
use crate::sim_params::SimParams;
use std::path::Path;

// Lattice dimensions, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GridConfig {
    #[serde(default = "default_grid_dim")]
    pub height: usize,
    #[serde(default = "default_grid_dim")]
    pub width: usize,
}

// Initial conditions for the simulation, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct InitialConditions {
    /// Probability that any single cell starts fully infected.
    #[serde(default = "default_infected_seed_ratio")]
    pub infected_seed_ratio: f32,
    /// Seed for the controller's RNG. Only initialisation and reset draw from it.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

// Starting transmission parameters. Both may be changed while running.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct EpidemicConfig {
    #[serde(default = "default_beta")]
    pub beta: f32,
    #[serde(default = "default_gamma")]
    pub gamma: f32,
}

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    #[serde(default = "default_dt")]
    pub dt: f32,
    #[serde(default = "default_total_steps")]
    pub total_steps: u32,
    #[serde(default = "default_record_interval_steps")]
    pub record_interval_steps: u32,
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_base_filename")]
    pub base_filename: String,
    #[serde(default = "default_true")]
    pub save_stats: bool,
    #[serde(default = "default_true")]
    pub save_final_grid: bool,
    #[serde(default)]
    pub save_labels_in_snapshot: bool,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
    /// Number of recent mean triples the driver keeps for status reporting.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct EnsembleConfig {
    #[serde(default = "default_replicates")]
    pub replicates: u32,
}

/// A scripted parameter change, applied right before the step with index `step`.
/// This is the headless stand-in for slider and button input.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ParameterChange {
    pub step: u32,
    #[serde(default)]
    pub beta: Option<f32>,
    #[serde(default)]
    pub gamma: Option<f32>,
    #[serde(default)]
    pub reset: bool,
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SimulationConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub initial_conditions: InitialConditions,
    #[serde(default)]
    pub epidemic: EpidemicConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub ensemble: EnsembleConfig,
    #[serde(default)]
    pub schedule: Vec<ParameterChange>,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig { height: default_grid_dim(), width: default_grid_dim() }
    }
}

impl Default for InitialConditions {
    fn default() -> Self {
        InitialConditions {
            infected_seed_ratio: default_infected_seed_ratio(),
            seed: default_seed(),
        }
    }
}

impl Default for EpidemicConfig {
    fn default() -> Self {
        EpidemicConfig { beta: default_beta(), gamma: default_gamma() }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            dt: default_dt(),
            total_steps: default_total_steps(),
            record_interval_steps: default_record_interval_steps(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: default_base_filename(),
            save_stats: true,
            save_final_grid: true,
            save_labels_in_snapshot: false,
            format: None,
            history_window: default_history_window(),
        }
    }
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        EnsembleConfig { replicates: default_replicates() }
    }
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read config file '{}'", path_ref.display()))?;
        Self::from_toml_str(&config_str)
            .with_context(|| format!("Invalid configuration in '{}'", path_ref.display()))
    }

    /// Parses and validates a configuration held in memory.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the engine cannot run. Transmission rates are
    /// deliberately not checked here; the engine accepts any value for them.
    pub fn validate(&self) -> Result<()> {
        if self.grid.height == 0 || self.grid.width == 0 {
            anyhow::bail!(
                "grid dimensions must be positive (got {}x{}).",
                self.grid.height,
                self.grid.width
            );
        }
        if !self.timing.dt.is_finite() || self.timing.dt < 0.0 {
            anyhow::bail!("dt must be finite and non-negative (got {}).", self.timing.dt);
        }
        if !self.initial_conditions.infected_seed_ratio.is_finite() {
            anyhow::bail!("infected_seed_ratio must be a finite number.");
        }
        if self.ensemble.replicates == 0 {
            anyhow::bail!("replicates must be greater than 0.");
        }
        if self.output.history_window == 0 {
            anyhow::bail!("history_window must be greater than 0.");
        }
        Ok(())
    }

    /// Converts the configuration into simulation parameters used at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        SimParams {
            grid_height: self.grid.height,
            grid_width: self.grid.width,
            num_cells: self.grid.height * self.grid.width,
            dt: self.timing.dt,
            time_step: 0,
            beta: self.epidemic.beta,
            gamma: self.epidemic.gamma,
            infected_seed_ratio: self.initial_conditions.infected_seed_ratio,
        }
    }

    /// Scheduled changes that fire before step `step`, in file order.
    pub fn changes_at(&self, step: u32) -> impl Iterator<Item = &ParameterChange> {
        self.schedule.iter().filter(move |c| c.step == step)
    }
}

fn default_grid_dim() -> usize {
    40
}

fn default_infected_seed_ratio() -> f32 {
    0.04
}

fn default_seed() -> u64 {
    42
}

fn default_beta() -> f32 {
    0.35
}

fn default_gamma() -> f32 {
    0.10
}

fn default_dt() -> f32 {
    0.2
}

fn default_total_steps() -> u32 {
    500
}

fn default_record_interval_steps() -> u32 {
    1
}

fn default_base_filename() -> String {
    "epigrid".to_string()
}

fn default_true() -> bool {
    true
}

fn default_history_window() -> usize {
    100
}

fn default_replicates() -> u32 {
    1
}
