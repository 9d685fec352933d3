pub mod config;
pub mod sim_params;
pub mod snapshot;

// Re-export key types for easier use by dependent crates
pub use config::{SimulationConfig, GridConfig, InitialConditions, EpidemicConfig, TimingConfig, OutputConfig, EnsembleConfig, ParameterChange};
pub use sim_params::SimParams;
pub use snapshot::{Compartment, Snapshot};
