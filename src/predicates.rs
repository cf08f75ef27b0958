//! Local admissibility tests for a single-step move from `old` to `new`.
//!
//! `direction` always points from `old` to `new`. Rotation offsets are counted
//! counterclockwise from `direction`, so around `old` offset 0 is `new`, and
//! around `new` offset 3 is `old`. The two cells adjacent to both are `old`'s
//! offsets 1 and 5 (equivalently `new`'s offsets 2 and 4).

use compsim_common::{Direction, HexCoord};

use crate::grid::LatticeGrid;
use crate::particle::ClassFilter;

/// Largest neighbor count at `old` for which a move is still considered.
pub const MAX_MOVABLE_NEIGHBORS: usize = 4;

/// Flips allowed in a sampled neighborhood before it counts as jagged.
const MAX_BOUNDARY_FLIPS: usize = 2;

#[inline(always)]
fn occupied<G: LatticeGrid + ?Sized>(
    grid: &G,
    position: HexCoord,
    direction: Direction,
    offset: i32,
    filter: &ClassFilter,
) -> bool {
    grid.get_neighbor_in_direction(position, direction.shift_counterclockwise_by(offset), filter)
        .is_some()
}

/// True when at least one of the two cells shared by `old` and `new` is occupied.
#[inline(always)]
pub fn has_common_neighbor<G: LatticeGrid + ?Sized>(
    grid: &G,
    old: HexCoord,
    direction: Direction,
    filter: &ClassFilter,
) -> bool {
    occupied(grid, old, direction, 5, filter) || occupied(grid, old, direction, 1, filter)
}

/// Number of adjacent pairs that differ in a sampled occupancy sequence.
fn count_flips(samples: &[bool]) -> usize {
    samples.windows(2).filter(|w| w[0] != w[1]).count()
}

/// Smooth-boundary test for a move that keeps a common neighbor.
///
/// Samples the five cells around `old` at offsets 1..=5 and the five cells
/// around `new` at offsets 4..=8; each sequence starts and ends on the shared
/// cells. The move is admissible iff both sequences change between empty and
/// occupied at most twice, which keeps every neighbor attached to a shared cell.
pub fn property1<G: LatticeGrid + ?Sized>(
    grid: &G,
    old: HexCoord,
    new: HexCoord,
    direction: Direction,
    filter: &ClassFilter,
) -> bool {
    if !has_common_neighbor(grid, old, direction, filter) {
        return false;
    }

    let around_old: [bool; 5] = std::array::from_fn(|i| occupied(grid, old, direction, i as i32 + 1, filter));
    let around_new: [bool; 5] = std::array::from_fn(|i| occupied(grid, new, direction, i as i32 + 4, filter));

    count_flips(&around_old) <= MAX_BOUNDARY_FLIPS && count_flips(&around_new) <= MAX_BOUNDARY_FLIPS
}

/// Admissibility test for a move with no common neighbor.
///
/// `new` must touch something other than the moving particle, and neither the
/// far side of `old` (offsets 2, 3, 4) nor the far side of `new` (offsets
/// 1, 0, 5) may read occupied, empty, occupied.
pub fn property2<G: LatticeGrid + ?Sized>(
    grid: &G,
    old: HexCoord,
    new: HexCoord,
    direction: Direction,
    filter: &ClassFilter,
) -> bool {
    if has_common_neighbor(grid, old, direction, filter) {
        return false;
    }

    // The moving particle itself is one of these.
    if grid.neighbor_count(new, filter) <= 1 {
        return false;
    }

    let split = |pos: HexCoord, offsets: [i32; 3]| {
        occupied(grid, pos, direction, offsets[0], filter)
            && !occupied(grid, pos, direction, offsets[1], filter)
            && occupied(grid, pos, direction, offsets[2], filter)
    };

    !split(old, [2, 3, 4]) && !split(new, [1, 0, 5])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::HexGrid;
    use crate::particle::ParticleClass;

    fn grid_with(cells: &[(i32, i32)]) -> HexGrid {
        let mut grid = HexGrid::new(12, 12);
        for &(q, r) in cells {
            grid.add_particle(HexCoord::new(q, r), ParticleClass(0)).unwrap();
        }
        grid
    }

    const OLD: HexCoord = HexCoord { q: 5, r: 5 };
    const NEW_EAST: HexCoord = HexCoord { q: 6, r: 5 };

    #[test]
    fn test_count_flips() {
        assert_eq!(count_flips(&[false, false, false, false, true]), 1);
        assert_eq!(count_flips(&[true, false, false, false, true]), 2);
        assert_eq!(count_flips(&[true, false, true, false, false]), 3);
        assert_eq!(count_flips(&[true; 5]), 0);
    }

    #[test]
    fn test_property1_slide_along_neighbor() {
        // A slides from (5,5) NorthEast to (6,4), keeping contact with B at (6,5).
        let grid = grid_with(&[(5, 5), (6, 5)]);
        let new = OLD.neighbor(Direction::NorthEast);
        assert!(property1(&grid, OLD, new, Direction::NorthEast, &ClassFilter::All));
        assert!(!property2(&grid, OLD, new, Direction::NorthEast, &ClassFilter::All));
    }

    #[test]
    fn test_property1_requires_common_neighbor() {
        let grid = grid_with(&[(5, 5), (4, 5)]);
        assert!(!property1(&grid, OLD, NEW_EAST, Direction::East, &ClassFilter::All));
    }

    #[test]
    fn test_property1_rejects_jagged_origin() {
        // Around (5,5) heading East: NE occupied, NW empty, W occupied -> three flips.
        let grid = grid_with(&[(5, 5), (6, 4), (4, 5)]);
        assert!(!property1(&grid, OLD, NEW_EAST, Direction::East, &ClassFilter::All));
    }

    #[test]
    fn test_property1_ignores_filtered_classes() {
        let mut grid = grid_with(&[(5, 5)]);
        grid.add_particle(HexCoord::new(6, 5), ParticleClass(1)).unwrap();
        let new = OLD.neighbor(Direction::NorthEast);
        assert!(property1(&grid, OLD, new, Direction::NorthEast, &ClassFilter::All));
        assert!(!property1(&grid, OLD, new, Direction::NorthEast, &ClassFilter::from_classes(&[0])));
    }

    #[test]
    fn test_property2_accepts_straight_push() {
        // W behind, X ahead of the destination, no shared cells occupied.
        let grid = grid_with(&[(5, 5), (4, 5), (7, 5)]);
        assert!(property2(&grid, OLD, NEW_EAST, Direction::East, &ClassFilter::All));
        assert!(!property1(&grid, OLD, NEW_EAST, Direction::East, &ClassFilter::All));
    }

    #[test]
    fn test_property2_rejects_isolated_destination() {
        let grid = grid_with(&[(5, 5), (4, 5)]);
        assert!(!property2(&grid, OLD, NEW_EAST, Direction::East, &ClassFilter::All));
    }

    #[test]
    fn test_property2_rejects_split_origin() {
        // NW and SW of the origin occupied with W empty.
        let grid = grid_with(&[(5, 5), (5, 4), (4, 6), (7, 5)]);
        assert!(!property2(&grid, OLD, NEW_EAST, Direction::East, &ClassFilter::All));
    }

    #[test]
    fn test_property2_rejects_split_destination() {
        // NE and SE of the destination occupied with E empty.
        let grid = grid_with(&[(5, 5), (4, 5), (7, 4), (6, 6)]);
        assert!(!property2(&grid, OLD, NEW_EAST, Direction::East, &ClassFilter::All));
    }

    #[test]
    fn test_property2_requires_no_common_neighbor() {
        let grid = grid_with(&[(5, 5), (4, 5), (7, 5), (6, 4)]);
        assert!(!property2(&grid, OLD, NEW_EAST, Direction::East, &ClassFilter::All));
    }

    #[test]
    fn test_predicates_never_both_hold() {
        let configs: [&[(i32, i32)]; 4] = [
            &[(5, 5), (6, 5)],
            &[(5, 5), (4, 5), (7, 5)],
            &[(5, 5), (6, 4), (4, 5)],
            &[(5, 5), (5, 4), (4, 5), (4, 6)],
        ];
        for cells in configs {
            let grid = grid_with(cells);
            for d in Direction::ALL {
                let new = OLD.neighbor(d);
                if grid.get_particle(new).is_some() {
                    continue;
                }
                let p1 = property1(&grid, OLD, new, d, &ClassFilter::All);
                let p2 = property2(&grid, OLD, new, d, &ClassFilter::All);
                assert!(!(p1 && p2), "{:?} {:?}", cells, d);
            }
        }
    }
}
