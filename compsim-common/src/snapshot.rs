use serde::{Serialize, Deserialize};

/// A snapshot of the simulator counters and shape metrics at a given iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Number of proposal attempts made so far.
    pub iteration: u64,
    /// Accepted moves so far.
    pub movements: u64,
    /// Completed rounds so far.
    pub rounds: u64,
    /// Boundary length of the eligible particles.
    pub perimeter: u32,
    /// Center of mass (x, y) in the plane.
    pub center_of_mass: (f64, f64),
    pub property1_count: u64,
    pub property2_count: u64,
    /// Length of the acceptance-probability series at this point.
    pub probabilities_recorded: usize,
    /// Raw (q, r) cells of every particle, only if requested in the config.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<(i32, i32)>>,
}
