use serde::{Deserialize, Serialize};

/// Simulation parameters derived from the configuration, read at the start of every step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // Lattice
    pub grid_height: usize,
    pub grid_width: usize,
    pub num_cells: usize,

    // Time
    pub dt: f32,
    pub time_step: u32, // Current simulation step number

    // Transmission
    pub beta: f32,  // Infection rate
    pub gamma: f32, // Recovery rate

    // Seeding
    pub infected_seed_ratio: f32,
}

impl SimParams {
    /// Simulated time reached after `time_step` steps.
    pub fn elapsed_time(&self) -> f32 {
        self.time_step as f32 * self.dt
    }

    /// Basic reproduction number of the equivalent well-mixed model.
    /// Infinite when `gamma` is zero.
    pub fn r0(&self) -> f32 {
        if self.gamma != 0.0 { self.beta / self.gamma } else { f32::INFINITY }
    }
}
