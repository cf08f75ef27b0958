use compsim_common::HexCoord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable handle into the grid's particle arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub u32);

impl ParticleId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleClass(pub u16);

/// An occupant of exactly one lattice cell. `position` is kept current by the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub id: ParticleId,
    pub position: HexCoord,
    pub class: ParticleClass,
}

/// Selects which particle classes take part in a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClassFilter {
    #[default]
    All,
    Only(BTreeSet<ParticleClass>),
}

impl ClassFilter {
    /// Builds a filter from raw class numbers; an empty list means every class.
    pub fn from_classes(classes: &[u16]) -> Self {
        if classes.is_empty() {
            ClassFilter::All
        } else {
            ClassFilter::Only(classes.iter().map(|&c| ParticleClass(c)).collect())
        }
    }

    #[inline(always)]
    pub fn accepts(&self, class: ParticleClass) -> bool {
        match self {
            ClassFilter::All => true,
            ClassFilter::Only(classes) => classes.contains(&class),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_class_list_accepts_everything() {
        let filter = ClassFilter::from_classes(&[]);
        assert_eq!(filter, ClassFilter::All);
        assert!(filter.accepts(ParticleClass(0)));
        assert!(filter.accepts(ParticleClass(9)));
    }

    #[test]
    fn test_only_filter() {
        let filter = ClassFilter::from_classes(&[1, 3]);
        assert!(filter.accepts(ParticleClass(1)));
        assert!(filter.accepts(ParticleClass(3)));
        assert!(!filter.accepts(ParticleClass(0)));
    }
}
