use crate::grid_state::GridState;
use crate::simulation::SimulationController;
use anyhow::Result;
use epigrid_common::Snapshot;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable handle for hosts that drive and read the simulation from different
/// threads. Every operation holds the same lock for its whole duration, so readers
/// only ever see the lattice between steps.
#[derive(Clone)]
pub struct SharedSimulation {
    inner: Arc<Mutex<SimulationController>>,
}

impl SharedSimulation {
    pub fn new(controller: SimulationController) -> Self {
        Self { inner: Arc::new(Mutex::new(controller)) }
    }

    fn lock(&self) -> MutexGuard<'_, SimulationController> {
        // step() cannot panic mid-update, so a poisoned lock still guards a whole lattice.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn step(&self) {
        self.lock().step();
    }

    pub fn reset(&self) -> Result<()> {
        self.lock().reset()
    }

    pub fn set_beta(&self, beta: f32) {
        self.lock().set_beta(beta);
    }

    pub fn set_gamma(&self, gamma: f32) {
        self.lock().set_gamma(gamma);
    }

    pub fn means(&self) -> (f32, f32, f32) {
        self.lock().means()
    }

    pub fn snapshot(&self, include_labels: bool) -> Snapshot {
        self.lock().snapshot(include_labels)
    }

    /// Runs `f` against the lattice while the lock is held.
    pub fn read_grid<T>(&self, f: impl FnOnce(&GridState) -> T) -> T {
        f(self.lock().grid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epigrid_common::SimulationConfig;
    use std::thread;

    fn shared(height: usize, width: usize) -> SharedSimulation {
        let mut config = SimulationConfig::default();
        config.grid.height = height;
        config.grid.width = width;
        config.initial_conditions.infected_seed_ratio = 0.2;
        SharedSimulation::new(SimulationController::new(config).unwrap())
    }

    #[test]
    fn readers_never_observe_partial_steps() {
        let sim = shared(32, 32);
        let stepper = {
            let sim = sim.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    sim.step();
                }
            })
        };
        let reader = {
            let sim = sim.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    assert!(sim.read_grid(|grid| grid.is_valid(1e-6)));
                }
            })
        };
        stepper.join().unwrap();
        reader.join().unwrap();
        assert_eq!(sim.snapshot(false).step, 200);
    }

    #[test]
    fn setters_are_visible_through_clones() {
        let sim = shared(4, 4);
        let other = sim.clone();
        other.set_beta(0.9);
        other.set_gamma(0.05);
        let snap = sim.snapshot(false);
        assert_eq!(snap.beta, 0.9);
        assert_eq!(snap.gamma, 0.05);
    }

    #[test]
    fn reset_through_handle_restarts_counter() {
        let sim = shared(8, 8);
        sim.step();
        sim.step();
        sim.reset().unwrap();
        assert_eq!(sim.snapshot(false).step, 0);
        let (s, i, r) = sim.means();
        assert!((s + i + r - 1.0).abs() < 1e-6);
    }
}
