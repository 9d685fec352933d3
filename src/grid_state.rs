use anyhow::Result;
use epigrid_common::Compartment;
use rand::distr::Uniform;
use rand::Rng;

/// Holds the S, I and R fraction channels of the lattice.
///
/// Channels are stored row-major as separate vectors (`idx = row * width + col`),
/// so the neighbourhood operator can read the infected channel as one slice.
#[derive(Debug, Clone, PartialEq)]
pub struct GridState {
    height: usize,
    width: usize,
    susceptible: Vec<f32>,
    infected: Vec<f32>,
    recovered: Vec<f32>,
}

impl GridState {
    /// Creates a fully susceptible lattice, then flips each cell to fully infected
    /// with probability `infected_seed_ratio`, one uniform draw per cell.
    ///
    /// Ratios outside [0, 1] are accepted: at or below 0 nothing is infected, at or
    /// above 1 everything is.
    pub fn initialize<R: Rng>(
        height: usize,
        width: usize,
        infected_seed_ratio: f32,
        rng: &mut R,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&infected_seed_ratio) {
            log::warn!(
                "infected_seed_ratio {} is outside [0, 1]; seeding saturates.",
                infected_seed_ratio
            );
        }

        let num_cells = height * width;
        let mut grid = Self {
            height,
            width,
            susceptible: vec![1.0; num_cells],
            infected: vec![0.0; num_cells],
            recovered: vec![0.0; num_cells],
        };

        let unit_dist = Uniform::new(0.0f32, 1.0f32)?;
        for idx in 0..num_cells {
            if rng.sample(&unit_dist) < infected_seed_ratio {
                grid.susceptible[idx] = 0.0;
                grid.infected[idx] = 1.0;
            }
        }
        Ok(grid)
    }

    /// Builds a lattice from explicit channels. Fails if any channel length differs
    /// from `height * width`. The S+I+R invariant is not checked here.
    pub fn from_channels(
        height: usize,
        width: usize,
        susceptible: Vec<f32>,
        infected: Vec<f32>,
        recovered: Vec<f32>,
    ) -> Result<Self> {
        let num_cells = height * width;
        if susceptible.len() != num_cells || infected.len() != num_cells || recovered.len() != num_cells {
            anyhow::bail!(
                "channel lengths ({}, {}, {}) do not match a {}x{} grid.",
                susceptible.len(),
                infected.len(),
                recovered.len(),
                height,
                width
            );
        }
        Ok(Self { height, width, susceptible, infected, recovered })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn num_cells(&self) -> usize {
        self.susceptible.len()
    }

    #[inline(always)]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    pub fn susceptible(&self) -> &[f32] {
        &self.susceptible
    }

    pub fn infected(&self) -> &[f32] {
        &self.infected
    }

    pub fn recovered(&self) -> &[f32] {
        &self.recovered
    }

    /// Mutable access to all three channels at once, in S, I, R order.
    pub fn channels_mut(&mut self) -> (&mut [f32], &mut [f32], &mut [f32]) {
        (&mut self.susceptible, &mut self.infected, &mut self.recovered)
    }

    /// (S, I, R) of one cell.
    pub fn cell(&self, row: usize, col: usize) -> (f32, f32, f32) {
        let idx = self.index(row, col);
        (self.susceptible[idx], self.infected[idx], self.recovered[idx])
    }

    pub fn set_cell(&mut self, row: usize, col: usize, s: f32, i: f32, r: f32) {
        let idx = self.index(row, col);
        self.susceptible[idx] = s;
        self.infected[idx] = i;
        self.recovered[idx] = r;
    }

    /// Spatial mean of each channel. Accumulates in f64 so large lattices do not drift.
    pub fn means(&self) -> (f32, f32, f32) {
        let n = self.num_cells();
        if n == 0 {
            return (0.0, 0.0, 0.0);
        }
        let mean = |channel: &[f32]| (channel.iter().map(|&v| v as f64).sum::<f64>() / n as f64) as f32;
        (mean(&self.susceptible[..]), mean(&self.infected[..]), mean(&self.recovered[..]))
    }

    /// Row-major dominant compartment of every cell.
    pub fn dominant_labels(&self) -> Vec<Compartment> {
        (0..self.num_cells())
            .map(|idx| Compartment::dominant(self.susceptible[idx], self.infected[idx], self.recovered[idx]))
            .collect()
    }

    /// Number of cells dominated by each compartment, in S, I, R order.
    pub fn dominant_counts(&self) -> [u32; 3] {
        let mut counts = [0u32; 3];
        for label in self.dominant_labels() {
            counts[label.index()] += 1;
        }
        counts
    }

    /// Largest |S+I+R - 1| over all cells.
    pub fn max_sum_deviation(&self) -> f32 {
        (0..self.num_cells())
            .map(|idx| (self.susceptible[idx] + self.infected[idx] + self.recovered[idx] - 1.0).abs())
            .fold(0.0, f32::max)
    }

    /// True if every fraction lies in [0, 1] and every cell sums to 1 within `tolerance`.
    pub fn is_valid(&self, tolerance: f32) -> bool {
        let in_range = |channel: &[f32]| channel.iter().all(|v| (0.0..=1.0).contains(v));
        in_range(&self.susceptible[..])
            && in_range(&self.infected[..])
            && in_range(&self.recovered[..])
            && self.max_sum_deviation() <= tolerance
    }
}
