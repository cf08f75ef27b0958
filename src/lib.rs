//! Biased compression of a particle collective on a hexagonal lattice.
//!
//! Particles repeatedly propose single-cell moves; a move is kept only if the
//! local shape tests in [`predicates`] hold and a Metropolis-style draw against
//! `bias^(neighbors gained)` succeeds. With `bias > 1` the collective tends to
//! contract toward a low-perimeter shape.

pub mod error;
pub mod experiment;
pub mod grid;
pub mod particle;
pub mod predicates;
pub mod shapes;
pub mod simulation;

pub use error::{GridError, SimulationError};
pub use grid::{HexGrid, LatticeGrid};
pub use particle::{ClassFilter, Particle, ParticleClass, ParticleId};
pub use simulation::{CompressionSimulator, Metric, MetricFormat, MetricValue};
