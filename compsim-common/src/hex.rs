use serde::{Deserialize, Serialize};
use std::fmt;

/// The six lattice directions, listed in counterclockwise order starting East.
///
/// The ordering matters: `shift_counterclockwise_by` rotates by stepping through
/// this list, so index arithmetic on it is the rotation helper.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    East,
    NorthEast,
    NorthWest,
    West,
    SouthWest,
    SouthEast,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::East,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::West,
        Direction::SouthWest,
        Direction::SouthEast,
    ];

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Rotates `offset` steps counterclockwise. Negative offsets rotate clockwise.
    #[inline(always)]
    pub fn shift_counterclockwise_by(self, offset: i32) -> Self {
        let idx = (self.index() as i32 + offset).rem_euclid(6);
        Self::ALL[idx as usize]
    }

    /// (dq, dr) step in axial coordinates.
    #[inline(always)]
    pub fn axial_offset(self) -> (i32, i32) {
        match self {
            Direction::East => (1, 0),
            Direction::NorthEast => (1, -1),
            Direction::NorthWest => (0, -1),
            Direction::West => (-1, 0),
            Direction::SouthWest => (-1, 1),
            Direction::SouthEast => (0, 1),
        }
    }
}

/// Axial hex coordinate (q = column, r = row).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    #[inline(always)]
    pub fn new(q: i32, r: i32) -> Self { Self { q, r } }

    #[inline(always)]
    pub fn neighbor(self, direction: Direction) -> Self {
        let (dq, dr) = direction.axial_offset();
        Self::new(self.q + dq, self.r + dr)
    }

    /// All 6 adjacent cells, in `Direction::ALL` order.
    pub fn neighbors(self) -> [HexCoord; 6] {
        Direction::ALL.map(|d| self.neighbor(d))
    }

    /// Center of the cell in the plane, pointy-top layout with unit spacing
    /// between adjacent centers.
    pub fn to_cartesian(self) -> (f64, f64) {
        let x = self.q as f64 + self.r as f64 / 2.0;
        let y = self.r as f64 * 3.0_f64.sqrt() / 2.0;
        (x, y)
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}
