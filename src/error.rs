use compsim_common::HexCoord;
use thiserror::Error;

use crate::particle::ParticleId;

/// Failures of grid mutation. The move engine checks bounds and occupancy
/// before relocating, so seeing one of these from a move is a bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("position {0} is outside the grid")]
    OutOfBounds(HexCoord),
    #[error("position {0} is already occupied")]
    Occupied(HexCoord),
    #[error("no particle at {0}")]
    EmptyCell(HexCoord),
    #[error("unknown particle {0}")]
    UnknownParticle(ParticleId),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error(transparent)]
    Grid(#[from] GridError),
}
