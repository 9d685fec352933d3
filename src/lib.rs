//! Spatial SIR epidemic engine on a toroidal lattice.
//!
//! Each cell carries susceptible, infected and recovered fractions that sum to one.
//! A step averages the infected fraction over every cell's 8 Moore neighbours,
//! advances the SIR equations by one explicit Euler step using that local pressure,
//! then clips and renormalises the cells. [`SimulationController`] is the entry
//! point for hosts; [`SharedSimulation`] wraps it for multi-threaded hosts.

pub mod ensemble;
pub mod grid;
pub mod grid_state;
pub mod history;
pub mod integrator;
pub mod normalizer;
pub mod output;
pub mod runner;
pub mod shared;
pub mod simulation;

pub use grid_state::GridState;
pub use shared::SharedSimulation;
pub use simulation::SimulationController;
