use compsim_common::{Direction, HexCoord};
use std::collections::VecDeque;

use crate::error::GridError;
use crate::particle::{ClassFilter, Particle, ParticleClass, ParticleId};

/// The lattice capabilities the move engine consumes.
///
/// Only `get_particle`, bounds, the arena lookup and the aggregate metrics have
/// to be provided; the neighborhood queries are derived from them.
pub trait LatticeGrid {
    /// True if every particle belongs to a single connected component.
    fn particles_connected(&self) -> bool;

    /// True if the particle mass has at least one empty, reachable cell next to it.
    fn particle_holes(&self) -> bool;

    /// Ids of every particle whose class passes `filter`, in arena order.
    fn get_all_particles(&self, filter: &ClassFilter) -> Vec<ParticleId>;

    fn particle(&self, id: ParticleId) -> Option<&Particle>;

    fn is_position_in_bounds(&self, position: HexCoord) -> bool;

    /// Occupant of `position`, `None` when empty or out of bounds.
    fn get_particle(&self, position: HexCoord) -> Option<&Particle>;

    /// Relocates the occupant of `old_position` and updates its own position.
    fn move_particle(&mut self, old_position: HexCoord, new_position: HexCoord) -> Result<ParticleId, GridError>;

    fn calculate_perimeter(&self, filter: &ClassFilter) -> u32;

    fn find_center_of_mass(&self, filter: &ClassFilter) -> (f64, f64);

    #[inline(always)]
    fn get_position_in_direction(&self, position: HexCoord, direction: Direction) -> HexCoord {
        position.neighbor(direction)
    }

    fn get_neighbor_in_direction(
        &self,
        position: HexCoord,
        direction: Direction,
        filter: &ClassFilter,
    ) -> Option<&Particle> {
        self.get_particle(self.get_position_in_direction(position, direction))
            .filter(|p| filter.accepts(p.class))
    }

    /// Occupied cells adjacent to `position` whose class passes `filter`.
    fn neighbor_count(&self, position: HexCoord, filter: &ClassFilter) -> usize {
        Direction::ALL
            .iter()
            .filter(|&&d| self.get_neighbor_in_direction(position, d, filter).is_some())
            .count()
    }
}

/// Bounded hexagonal lattice over the axial parallelogram
/// `0 <= q < width`, `0 <= r < height`, with a particle arena.
#[derive(Debug, Clone)]
pub struct HexGrid {
    width: u32,
    height: u32,
    /// Occupant of each cell, indexed by `cell_index`.
    cells: Vec<Option<ParticleId>>,
    particles: Vec<Particle>,
}

impl HexGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
            particles: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Places a new particle; the returned id is its arena index.
    pub fn add_particle(&mut self, position: HexCoord, class: ParticleClass) -> Result<ParticleId, GridError> {
        let idx = self.cell_index(position).ok_or(GridError::OutOfBounds(position))?;
        if self.cells[idx].is_some() {
            return Err(GridError::Occupied(position));
        }
        let id = ParticleId(self.particles.len() as u32);
        self.particles.push(Particle { id, position, class });
        self.cells[idx] = Some(id);
        Ok(id)
    }

    /// Number of empty in-bounds cells that cannot be reached from the grid
    /// border without crossing a particle.
    pub fn enclosed_hole_count(&self) -> usize {
        let reachable = self.border_reachable_empty_cells();
        self.cells
            .iter()
            .zip(reachable.iter())
            .filter(|&(occupant, &seen)| occupant.is_none() && !seen)
            .count()
    }

    #[inline(always)]
    fn cell_index(&self, pos: HexCoord) -> Option<usize> {
        if pos.q < 0 || pos.r < 0 || pos.q >= self.width as i32 || pos.r >= self.height as i32 {
            return None;
        }
        Some(pos.r as usize * self.width as usize + pos.q as usize)
    }

    #[inline(always)]
    fn cell_coord(&self, idx: usize) -> HexCoord {
        let w = self.width as usize;
        HexCoord::new((idx % w) as i32, (idx / w) as i32)
    }

    /// Calls `f` for each in-bounds cell adjacent to `pos`.
    #[inline(always)]
    fn for_each_neighbor_cell<F>(&self, pos: HexCoord, mut f: F)
    where
        F: FnMut(usize),
    {
        for n in pos.neighbors() {
            if let Some(idx) = self.cell_index(n) {
                f(idx);
            }
        }
    }

    /// Flood fill over empty cells seeded from every empty border cell.
    fn border_reachable_empty_cells(&self) -> Vec<bool> {
        let mut seen = vec![false; self.cells.len()];
        let mut queue = VecDeque::new();

        for idx in 0..self.cells.len() {
            let c = self.cell_coord(idx);
            let on_border = c.q == 0
                || c.r == 0
                || c.q == self.width as i32 - 1
                || c.r == self.height as i32 - 1;
            if on_border && self.cells[idx].is_none() {
                seen[idx] = true;
                queue.push_back(idx);
            }
        }

        while let Some(idx) = queue.pop_front() {
            let pos = self.cell_coord(idx);
            self.for_each_neighbor_cell(pos, |n| {
                if !seen[n] && self.cells[n].is_none() {
                    seen[n] = true;
                    queue.push_back(n);
                }
            });
        }
        seen
    }
}

impl LatticeGrid for HexGrid {
    fn particles_connected(&self) -> bool {
        let Some(first) = self.particles.first() else {
            return false;
        };

        let mut seen = vec![false; self.particles.len()];
        let mut queue = VecDeque::new();
        seen[first.id.index()] = true;
        queue.push_back(first.position);
        let mut reached = 1;

        while let Some(pos) = queue.pop_front() {
            self.for_each_neighbor_cell(pos, |n| {
                if let Some(id) = self.cells[n] {
                    if !seen[id.index()] {
                        seen[id.index()] = true;
                        reached += 1;
                        queue.push_back(self.particles[id.index()].position);
                    }
                }
            });
        }
        reached == self.particles.len()
    }

    fn particle_holes(&self) -> bool {
        let reachable = self.border_reachable_empty_cells();
        self.particles.iter().any(|p| {
            p.position
                .neighbors()
                .iter()
                .filter_map(|&n| self.cell_index(n))
                .any(|idx| reachable[idx])
        })
    }

    fn get_all_particles(&self, filter: &ClassFilter) -> Vec<ParticleId> {
        self.particles
            .iter()
            .filter(|p| filter.accepts(p.class))
            .map(|p| p.id)
            .collect()
    }

    fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id.index())
    }

    #[inline(always)]
    fn is_position_in_bounds(&self, position: HexCoord) -> bool {
        self.cell_index(position).is_some()
    }

    #[inline(always)]
    fn get_particle(&self, position: HexCoord) -> Option<&Particle> {
        let idx = self.cell_index(position)?;
        self.cells[idx].map(|id| &self.particles[id.index()])
    }

    fn move_particle(&mut self, old_position: HexCoord, new_position: HexCoord) -> Result<ParticleId, GridError> {
        let old_idx = self.cell_index(old_position).ok_or(GridError::OutOfBounds(old_position))?;
        let new_idx = self.cell_index(new_position).ok_or(GridError::OutOfBounds(new_position))?;
        let id = self.cells[old_idx].ok_or(GridError::EmptyCell(old_position))?;
        if self.cells[new_idx].is_some() {
            return Err(GridError::Occupied(new_position));
        }

        self.cells[old_idx] = None;
        self.cells[new_idx] = Some(id);
        self.particles[id.index()].position = new_position;
        Ok(id)
    }

    /// Boundary-walk length `3n - e - 3`, exact for connected configurations without holes.
    fn calculate_perimeter(&self, filter: &ClassFilter) -> u32 {
        let mut n: i64 = 0;
        let mut edges: i64 = 0;
        for p in self.particles.iter().filter(|p| filter.accepts(p.class)) {
            n += 1;
            // Half the directions, so each adjacent pair is counted once.
            for d in [Direction::East, Direction::NorthEast, Direction::NorthWest] {
                if self.get_neighbor_in_direction(p.position, d, filter).is_some() {
                    edges += 1;
                }
            }
        }
        if n < 2 {
            return 0;
        }
        (3 * n - edges - 3).max(0) as u32
    }

    fn find_center_of_mass(&self, filter: &ClassFilter) -> (f64, f64) {
        let (mut sum_x, mut sum_y, mut count) = (0.0, 0.0, 0usize);
        for p in self.particles.iter().filter(|p| filter.accepts(p.class)) {
            let (x, y) = p.position.to_cartesian();
            sum_x += x;
            sum_y += y;
            count += 1;
        }
        if count == 0 {
            return (0.0, 0.0);
        }
        (sum_x / count as f64, sum_y / count as f64)
    }
}
