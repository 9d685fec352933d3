use serde::{Serialize, Deserialize};

/// The epidemiological compartment a cell is dominated by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compartment {
    Susceptible,
    Infected,
    Recovered,
}

impl Compartment {
    pub const ALL: [Compartment; 3] = [Compartment::Susceptible, Compartment::Infected, Compartment::Recovered];

    /// Argmax over a cell's fractions. Ties go to the earlier compartment in S, I, R order.
    pub fn dominant(s: f32, i: f32, r: f32) -> Self {
        if s >= i && s >= r {
            Compartment::Susceptible
        } else if i >= r {
            Compartment::Infected
        } else {
            Compartment::Recovered
        }
    }

    pub fn index(self) -> usize {
        match self {
            Compartment::Susceptible => 0,
            Compartment::Infected => 1,
            Compartment::Recovered => 2,
        }
    }
}

/// A snapshot of the lattice aggregates at a specific step.
#[derive(Debug, Clone, Serialize, Deserialize)] // Derive traits for easy saving/loading
pub struct Snapshot {
    /// Step counter at which the snapshot was taken.
    pub step: u32,
    /// Simulated time (step * dt).
    pub time: f32,
    /// Parameters in effect for the next step.
    pub beta: f32,
    pub gamma: f32,
    /// Spatial means over the whole grid.
    pub mean_susceptible: f32,
    pub mean_infected: f32,
    pub mean_recovered: f32,
    /// Number of cells dominated by each compartment, in S, I, R order.
    pub dominant_counts: [u32; 3],
    /// Row-major dominant labels for every cell.
    /// Included only if `config.output.save_labels_in_snapshot` is true.
    #[serde(skip_serializing_if = "Option::is_none")] // Don't write "labels": null
    #[serde(default)]
    pub labels: Option<Vec<Compartment>>,
}

impl Snapshot {
    pub fn means(&self) -> (f32, f32, f32) {
        (self.mean_susceptible, self.mean_infected, self.mean_recovered)
    }
}
