use anyhow::Result;
use compsim_common::{HexCoord, ShapeKind};
use log::debug;
use rand::prelude::*;
use rand::seq::IndexedRandom;

use crate::grid::{HexGrid, LatticeGrid};
use crate::particle::{ClassFilter, ParticleClass};

/// Builds a fresh grid holding the requested initial configuration.
/// Classes are assigned round-robin over `num_classes`.
pub fn build_initial_grid(
    width: u32,
    height: u32,
    shape: ShapeKind,
    num_particles: u32,
    num_classes: u16,
    rng: &mut StdRng,
) -> Result<HexGrid> {
    let cells = match shape {
        ShapeKind::Line => line_cells(width, height, num_particles)?,
        ShapeKind::Tree => tree_cells(width, height, num_particles, rng)?,
    };

    let mut grid = HexGrid::new(width, height);
    let num_classes = num_classes.max(1);
    for (i, cell) in cells.into_iter().enumerate() {
        let class = ParticleClass((i % num_classes as usize) as u16);
        grid.add_particle(cell, class)?;
    }
    debug!(
        "Built {:?} shape with {} particles, perimeter {}.",
        shape,
        grid.particle_count(),
        grid.calculate_perimeter(&ClassFilter::All)
    );
    Ok(grid)
}

/// A horizontal row centered on the grid.
fn line_cells(width: u32, height: u32, num_particles: u32) -> Result<Vec<HexCoord>> {
    if num_particles >= width {
        anyhow::bail!(
            "A line of {} particles needs a grid wider than {} cells.",
            num_particles,
            width
        );
    }
    let start_q = ((width - num_particles) / 2) as i32;
    let r = (height / 2) as i32;
    Ok((0..num_particles as i32).map(|i| HexCoord::new(start_q + i, r)).collect())
}

/// Random growth from the grid center. A cell is only added when exactly one of
/// its neighbors is already taken, so the adjacency graph stays a tree: the
/// result is connected, loosely packed and encloses no empty cells.
fn tree_cells(width: u32, height: u32, num_particles: u32, rng: &mut StdRng) -> Result<Vec<HexCoord>> {
    let mut grid = HexGrid::new(width, height);
    let origin = HexCoord::new((width / 2) as i32, (height / 2) as i32);
    grid.add_particle(origin, ParticleClass::default())?;
    let mut cells = vec![origin];

    while cells.len() < num_particles as usize {
        let mut candidates: Vec<HexCoord> = cells
            .iter()
            .flat_map(|c| c.neighbors())
            .filter(|&n| {
                grid.is_position_in_bounds(n)
                    && grid.get_particle(n).is_none()
                    && grid.neighbor_count(n, &ClassFilter::All) == 1
            })
            .collect();
        candidates.sort_unstable_by_key(|c| (c.r, c.q));
        candidates.dedup();

        let Some(&next) = candidates.choose(rng) else {
            anyhow::bail!(
                "Could not grow a tree of {} particles on a {}x{} grid (stopped at {}).",
                num_particles,
                width,
                height,
                cells.len()
            );
        };
        grid.add_particle(next, ParticleClass::default())?;
        cells.push(next);
    }
    Ok(cells)
}
