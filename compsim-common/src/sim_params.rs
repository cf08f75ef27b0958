use serde::{Deserialize, Serialize};
use crate::config::ShapeKind;

/// Runtime parameters derived from the configuration, shared by every trial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // Lattice
    pub grid_width: u32,
    pub grid_height: u32,

    // Initial configuration
    pub shape: ShapeKind,
    pub num_particles: u32,
    pub num_classes: u16,
    pub placement_seed: u64,

    // Move engine
    pub bias: f64,
    pub iterations: u64,
    pub record_interval_iterations: u64,
    pub seed: u64,
    pub classes_to_move: Vec<u16>, // Sorted, deduplicated; empty = all classes

    pub save_positions_in_snapshot: bool,
}
