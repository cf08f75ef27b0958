pub mod config;
pub mod hex;
pub mod sim_params;
pub mod snapshot;

// Re-export key types for easier use by dependent crates
pub use config::{SimulationConfig, GridConfig, InitialConditions, SimulationSettings, OutputConfig, ShapeKind};
pub use hex::{Direction, HexCoord};
pub use sim_params::SimParams;
pub use snapshot::Snapshot;
