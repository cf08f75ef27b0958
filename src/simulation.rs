use compsim_common::{Direction, HexCoord};
use log::{debug, trace, warn};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use crate::error::{GridError, SimulationError};
use crate::grid::LatticeGrid;
use crate::particle::{ClassFilter, ParticleId};
use crate::predicates::{property1, property2, MAX_MOVABLE_NEIGHBORS};

/// How a metric value should be rendered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MetricFormat {
    /// Two decimals, e.g. `4.00`.
    Decimal2,
    Integer,
    /// `x = 1.00, y = 2.00`
    Point2,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MetricValue {
    Float(f64),
    Count(u64),
    Point(f64, f64),
}

/// One labelled entry of the summary returned by `get_metrics`.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub label: &'static str,
    pub format: MetricFormat,
    pub value: MetricValue,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.label)?;
        match (self.format, self.value) {
            (MetricFormat::Decimal2, MetricValue::Float(v)) => write!(f, "{:.2}", v),
            (MetricFormat::Integer, MetricValue::Count(v)) => write!(f, "{}", v),
            (MetricFormat::Integer, MetricValue::Float(v)) => write!(f, "{:.0}", v),
            (MetricFormat::Point2, MetricValue::Point(x, y)) => write!(f, "x = {:.2}, y = {:.2}", x, y),
            (_, MetricValue::Float(v)) => write!(f, "{}", v),
            (_, MetricValue::Count(v)) => write!(f, "{}", v),
            (_, MetricValue::Point(x, y)) => write!(f, "({}, {})", x, y),
        }
    }
}

/// Largest neighbor difference a move can produce on a hex lattice.
const MAX_PROBABILITY_EXPONENT: i32 = 6;

/// Drives the biased compression dynamics on a particle lattice.
///
/// Each proposal picks a particle, a direction and a uniform draw. A move is
/// committed only if the destination is in bounds and empty, the local shape
/// test passes, and the draw falls below `bias^(neighbors gained)`.
pub struct CompressionSimulator<G: LatticeGrid> {
    grid: G,
    bias: f64,
    started_at: Instant,

    rounds: u64,
    movements: u64,
    /// Particles that moved since the last round boundary.
    visited: HashSet<ParticleId>,

    property1_count: u64,
    property2_count: u64,
    iterations_run: u64,

    /// Acceptance probability of every move that passed the geometric checks, in order.
    probability_series: Vec<f64>,
}

impl<G: LatticeGrid> CompressionSimulator<G> {
    /// Takes ownership of `grid`. Fails unless the particles are connected,
    /// the mass has a reachable empty cell, and `bias` is positive and finite.
    pub fn new(grid: G, bias: f64) -> Result<Self, SimulationError> {
        Self::validate_grid(&grid)?;
        if !bias.is_finite() || bias <= 0.0 {
            return Err(SimulationError::InvalidConfiguration(format!(
                "bias must be a positive finite number, got {}",
                bias
            )));
        }
        let (strongest, weakest) = (bias.powi(MAX_PROBABILITY_EXPONENT), bias.powi(-MAX_PROBABILITY_EXPONENT));
        if !strongest.is_normal() || !weakest.is_normal() {
            return Err(SimulationError::InvalidConfiguration(format!(
                "bias {} overflows the move probability range (bias^±{} must be finite and non-zero)",
                bias, MAX_PROBABILITY_EXPONENT
            )));
        }

        debug!("Compression simulator created with bias {:.2}.", bias);
        Ok(Self {
            grid,
            bias,
            started_at: Instant::now(),
            rounds: 0,
            movements: 0,
            visited: HashSet::new(),
            property1_count: 0,
            property2_count: 0,
            iterations_run: 0,
            probability_series: Vec::new(),
        })
    }

    pub fn validate_grid(grid: &G) -> Result<(), SimulationError> {
        if !grid.particles_connected() {
            return Err(SimulationError::InvalidConfiguration(
                "particles do not form a single connected component".into(),
            ));
        }
        if !grid.particle_holes() {
            return Err(SimulationError::InvalidConfiguration(
                "particle mass has no reachable empty cell".into(),
            ));
        }
        Ok(())
    }

    /// Runs `iterations` proposal attempts and returns how many were accepted.
    ///
    /// The eligible set is snapshotted once per call; particles are looked up
    /// by id on every attempt, so their positions are always current.
    pub fn run_iterations<R: Rng + ?Sized>(
        &mut self,
        iterations: u64,
        classes_to_move: &ClassFilter,
        rng: &mut R,
    ) -> Result<u64, SimulationError> {
        let particles = self.grid.get_all_particles(classes_to_move);
        if particles.is_empty() && iterations > 0 {
            warn!("No particles eligible to move; {} attempts will be idle.", iterations);
        }

        let mut moves_made = 0;
        for _ in 0..iterations {
            if let Some(&particle) = particles.choose(rng) {
                let direction = Direction::ALL[rng.random_range(0..Direction::ALL.len())];
                let draw: f64 = rng.random();
                if self.move_particle(particle, direction, draw, classes_to_move)? {
                    moves_made += 1;
                }
            }
            self.iterations_run += 1;
        }

        trace!(
            "run_iterations: {} attempts, {} accepted, {} rounds so far.",
            iterations,
            moves_made,
            self.rounds
        );
        Ok(moves_made)
    }

    /// Per-particle bias. Uniform for now.
    pub fn get_bias(&self, _particle: ParticleId) -> f64 {
        self.bias
    }

    /// `bias^(neighbors(new) - 1 - neighbors(old))`. The destination count
    /// includes the moving particle itself, hence the `- 1`.
    pub fn get_move_probability(&self, particle: ParticleId, current: HexCoord, new: HexCoord) -> f64 {
        let current_neighbors = self.grid.neighbor_count(current, &ClassFilter::All) as i32;
        let new_neighbors = self.grid.neighbor_count(new, &ClassFilter::All) as i32 - 1;
        self.get_bias(particle).powi(new_neighbors - current_neighbors)
    }

    /// Attempts to move `particle` one step in `direction`.
    ///
    /// Returns `Ok(true)` iff the move was committed. Every expected rejection
    /// (bounds, occupancy, shape, probability) is `Ok(false)` with no grid
    /// mutation; `Err` only signals an unknown particle id or a grid fault.
    pub fn move_particle(
        &mut self,
        particle: ParticleId,
        direction: Direction,
        probability: f64,
        classes_to_move: &ClassFilter,
    ) -> Result<bool, SimulationError> {
        let current = self
            .grid
            .particle(particle)
            .ok_or(GridError::UnknownParticle(particle))?
            .position;
        let new = self.grid.get_position_in_direction(current, direction);

        if !self.grid.is_position_in_bounds(new) {
            return Ok(false);
        }
        if self.grid.get_particle(new).is_some() {
            return Ok(false);
        }
        if !self.valid_move(particle, current, new, direction) {
            return Ok(false);
        }

        let prob_move = self.get_move_probability(particle, current, new);
        self.probability_series.push(prob_move);

        // A NaN draw never passes.
        let accepted = probability < prob_move;
        if !accepted {
            return Ok(false);
        }

        self.grid.move_particle(current, new)?;
        self.movements += 1;
        self.mark_visited(particle, classes_to_move);
        Ok(true)
    }

    /// Records an accepted move and closes the round once every eligible
    /// particle has moved.
    fn mark_visited(&mut self, particle: ParticleId, classes_to_move: &ClassFilter) {
        let eligible = self
            .grid
            .particle(particle)
            .is_some_and(|p| classes_to_move.accepts(p.class));
        if eligible {
            self.visited.insert(particle);
        }

        let round_complete = self
            .grid
            .get_all_particles(classes_to_move)
            .iter()
            .all(|id| self.visited.contains(id));
        if round_complete {
            self.rounds += 1;
            self.visited.clear();
            trace!("Round {} completed after {} movements.", self.rounds, self.movements);
        }
    }

    /// Neighbor cap at the origin plus either shape property.
    ///
    /// Both properties are always evaluated so their diagnostic counters stay
    /// comparable across runs; they cannot both hold for one candidate.
    pub fn valid_move(&mut self, _particle: ParticleId, old: HexCoord, new: HexCoord, direction: Direction) -> bool {
        let movable = self.grid.neighbor_count(old, &ClassFilter::All) <= MAX_MOVABLE_NEIGHBORS;
        let p1 = self.property1(old, new, direction, &ClassFilter::All);
        let p2 = self.property2(old, new, direction, &ClassFilter::All);

        if p1 {
            self.property1_count += 1;
        }
        if p2 {
            self.property2_count += 1;
        }

        movable && (p1 || p2)
    }

    pub fn property1(&self, old: HexCoord, new: HexCoord, direction: Direction, classes: &ClassFilter) -> bool {
        property1(&self.grid, old, new, direction, classes)
    }

    pub fn property2(&self, old: HexCoord, new: HexCoord, direction: Direction, classes: &ClassFilter) -> bool {
        property2(&self.grid, old, new, direction, classes)
    }

    /// Summary of the run so far. Perimeter and center of mass come from the grid.
    pub fn get_metrics(&self, classes_to_move: &ClassFilter) -> Vec<Metric> {
        let (x, y) = self.grid.find_center_of_mass(classes_to_move);
        vec![
            Metric { label: "Bias", format: MetricFormat::Decimal2, value: MetricValue::Float(self.bias) },
            Metric { label: "Iterations", format: MetricFormat::Integer, value: MetricValue::Count(self.iterations_run) },
            Metric { label: "Movements made", format: MetricFormat::Integer, value: MetricValue::Count(self.movements) },
            Metric { label: "Rounds completed", format: MetricFormat::Integer, value: MetricValue::Count(self.rounds) },
            Metric {
                label: "Perimeter",
                format: MetricFormat::Integer,
                value: MetricValue::Count(self.grid.calculate_perimeter(classes_to_move) as u64),
            },
            Metric { label: "Center of mass", format: MetricFormat::Point2, value: MetricValue::Point(x, y) },
        ]
    }

    pub fn grid(&self) -> &G {
        &self.grid
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    pub fn movements(&self) -> u64 {
        self.movements
    }

    pub fn iterations_run(&self) -> u64 {
        self.iterations_run
    }

    pub fn property1_count(&self) -> u64 {
        self.property1_count
    }

    pub fn property2_count(&self) -> u64 {
        self.property2_count
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn probability_series(&self) -> &[f64] {
        &self.probability_series
    }

    /// Wall-clock time since construction.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
