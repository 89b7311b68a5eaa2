//! A crypt: a stem-cell population with up to six hex-grid neighbors.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use stemsim_types::{CellId, CryptId, HexDirection};

/// One crypt of the tissue.
///
/// The population is kept as an ordered set so that every walk over it
/// (cascade regeneration, bifurcation) visits cells in ascending id order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crypt {
    id: CryptId,
    row: u32,
    col: u32,
    cells: BTreeSet<CellId>,
    neighbors: [Option<CryptId>; 6],
}

impl Crypt {
    /// Create an empty crypt at a grid position.
    pub const fn new(id: CryptId, row: u32, col: u32) -> Self {
        Self {
            id,
            row,
            col,
            cells: BTreeSet::new(),
            neighbors: [None; 6],
        }
    }

    /// This crypt's id.
    pub const fn id(&self) -> CryptId {
        self.id
    }

    /// Grid row.
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Grid column.
    pub const fn col(&self) -> u32 {
        self.col
    }

    /// Number of cells in the crypt.
    pub fn population(&self) -> usize {
        self.cells.len()
    }

    /// Whether the crypt holds a cell.
    pub fn contains(&self, cell: CellId) -> bool {
        self.cells.contains(&cell)
    }

    /// Cells in ascending id order.
    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.iter().copied()
    }

    /// Add a cell. Returns `false` if it was already present.
    pub(crate) fn insert(&mut self, cell: CellId) -> bool {
        self.cells.insert(cell)
    }

    /// Remove a cell. Returns `false` if it was not present.
    pub(crate) fn remove(&mut self, cell: CellId) -> bool {
        self.cells.remove(&cell)
    }

    /// The neighbor in one direction, if any.
    pub fn neighbor(&self, direction: HexDirection) -> Option<CryptId> {
        self.neighbors.get(direction.slot()).copied().flatten()
    }

    /// All neighbors in slot order (NE, E, SE, SW, W, NW).
    pub fn neighbors(&self) -> impl Iterator<Item = CryptId> + '_ {
        self.neighbors.iter().filter_map(|n| *n)
    }

    pub(crate) fn set_neighbor(&mut self, direction: HexDirection, neighbor: Option<CryptId>) {
        if let Some(slot) = self.neighbors.get_mut(direction.slot()) {
            *slot = neighbor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_iterates_in_id_order() {
        let mut crypt = Crypt::new(CryptId::new(0), 0, 0);
        for raw in [5, 1, 3] {
            assert!(crypt.insert(CellId::new(raw)));
        }
        assert!(!crypt.insert(CellId::new(3)));
        let cells: Vec<_> = crypt.cells().map(CellId::into_inner).collect();
        assert_eq!(cells, vec![1, 3, 5]);
        assert!(crypt.remove(CellId::new(1)));
        assert!(!crypt.remove(CellId::new(1)));
        assert_eq!(crypt.population(), 2);
    }

    #[test]
    fn neighbor_slots() {
        let mut crypt = Crypt::new(CryptId::new(0), 0, 0);
        crypt.set_neighbor(HexDirection::West, Some(CryptId::new(4)));
        assert_eq!(crypt.neighbor(HexDirection::West), Some(CryptId::new(4)));
        assert_eq!(crypt.neighbor(HexDirection::East), None);
        assert_eq!(crypt.neighbors().count(), 1);
    }
}
