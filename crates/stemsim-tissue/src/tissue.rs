//! The tissue: a hex grid of crypts and the arena owning every cell.
//!
//! Crypts are laid out row-major. Odd rows sit half a crypt further east
//! than even rows, which gives each interior crypt six neighbors:
//!
//! ```text
//!  (0,0) (0,1) (0,2)
//!     (1,0) (1,1) (1,2)
//!  (2,0) (2,1) (2,2)
//! ```
//!
//! With wraparound the east and west edges are joined (columns wrap modulo
//! `cols`); rows never wrap. Every neighbor link is symmetric.
//!
//! Cells are owned by the tissue in a `BTreeMap<CellId, StemCell>`; crypts
//! only hold the ids of their population. A cell that dies is removed from
//! both.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stemsim_types::{CellId, CryptId, HexDirection, TsgLocation};
use tracing::debug;

use crate::cell::StemCell;
use crate::config::LayoutParams;
use crate::crypt::Crypt;
use crate::error::TissueError;

/// Stem hits a cell must carry before a stem knockout is recorded.
const STEM_KNOCKOUT_HITS: u32 = 2;

/// Stem hits a cell must carry before a TAC knockout is recorded.
const TAC_KNOCKOUT_STEM_HITS: u32 = 1;

/// The first tumor-suppressor knockout seen in one compartment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsgKnockout {
    /// Simulation time of the hit.
    pub time: f64,
    /// The cell that was hit.
    pub cell: CellId,
    /// The crypt the cell lived in.
    pub crypt: CryptId,
    /// Compartment of the knockout.
    pub location: TsgLocation,
    /// The cell's stem hits at the time of recording.
    pub stem_hits: u32,
    /// The cell's TAC hits at the time of recording.
    pub tac_hits: u32,
}

/// A hex grid of crypts plus the cells living in them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tissue {
    rows: u32,
    cols: u32,
    wraparound: bool,
    crypts: BTreeMap<CryptId, Crypt>,
    cells: BTreeMap<CellId, StemCell>,
    next_cell: CellId,
    knockouts: Vec<TsgKnockout>,
}

impl Tissue {
    // -------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------

    /// Build a `rows x cols` grid and seed every crypt with
    /// `cells_per_crypt` fresh cells.
    ///
    /// # Errors
    ///
    /// Returns [`TissueError::InvalidLayout`] if either dimension is zero or
    /// the resulting neighbor links are not symmetric.
    pub fn build(layout: &LayoutParams, cells_per_crypt: u32) -> Result<Self, TissueError> {
        if layout.rows == 0 || layout.cols == 0 {
            return Err(TissueError::InvalidLayout {
                reason: format!("{} rows x {} cols", layout.rows, layout.cols),
            });
        }

        let mut tissue = Self {
            rows: layout.rows,
            cols: layout.cols,
            wraparound: layout.wraparound,
            crypts: BTreeMap::new(),
            cells: BTreeMap::new(),
            next_cell: CellId::new(0),
            knockouts: Vec::new(),
        };

        for row in 0..layout.rows {
            for col in 0..layout.cols {
                let id = tissue.position_id(row, col);
                tissue.crypts.insert(id, Crypt::new(id, row, col));
            }
        }

        let mut links = Vec::new();
        for crypt in tissue.crypts.values() {
            for direction in HexDirection::ALL {
                let neighbor = tissue
                    .neighbor_position(crypt.row(), crypt.col(), direction)
                    .map(|(row, col)| tissue.position_id(row, col))
                    .filter(|neighbor| *neighbor != crypt.id());
                links.push((crypt.id(), direction, neighbor));
            }
        }
        for (id, direction, neighbor) in links {
            if let Some(crypt) = tissue.crypts.get_mut(&id) {
                crypt.set_neighbor(direction, neighbor);
            }
        }

        tissue.validate()?;

        let ids: Vec<CryptId> = tissue.crypts.keys().copied().collect();
        for id in ids {
            for _ in 0..cells_per_crypt {
                tissue.add_cell(id)?;
            }
        }

        debug!(
            rows = layout.rows,
            cols = layout.cols,
            wraparound = layout.wraparound,
            cells = tissue.cells.len(),
            "Tissue built"
        );
        Ok(tissue)
    }

    fn position_id(&self, row: u32, col: u32) -> CryptId {
        CryptId::new(
            u64::from(row)
                .saturating_mul(u64::from(self.cols))
                .saturating_add(u64::from(col)),
        )
    }

    /// Grid position of the neighbor of `(row, col)` in `direction`.
    fn neighbor_position(&self, row: u32, col: u32, direction: HexDirection) -> Option<(u32, u32)> {
        let odd = row % 2 == 1;
        let (d_row, d_col): (i64, i64) = match (direction, odd) {
            (HexDirection::NorthEast, false) => (-1, 0),
            (HexDirection::NorthEast, true) => (-1, 1),
            (HexDirection::East, _) => (0, 1),
            (HexDirection::SouthEast, false) => (1, 0),
            (HexDirection::SouthEast, true) => (1, 1),
            (HexDirection::SouthWest, false) => (1, -1),
            (HexDirection::SouthWest, true) => (1, 0),
            (HexDirection::West, _) => (0, -1),
            (HexDirection::NorthWest, false) => (-1, -1),
            (HexDirection::NorthWest, true) => (-1, 0),
        };

        let rows = i64::from(self.rows);
        let cols = i64::from(self.cols);
        let n_row = i64::from(row).checked_add(d_row)?;
        let mut n_col = i64::from(col).checked_add(d_col)?;
        if !(0..rows).contains(&n_row) {
            return None;
        }
        if self.wraparound {
            n_col = n_col.rem_euclid(cols);
        } else if !(0..cols).contains(&n_col) {
            return None;
        }
        Some((u32::try_from(n_row).ok()?, u32::try_from(n_col).ok()?))
    }

    /// Check that every neighbor link points back.
    ///
    /// # Errors
    ///
    /// Returns [`TissueError::InvalidLayout`] naming the first asymmetric link.
    pub fn validate(&self) -> Result<(), TissueError> {
        for crypt in self.crypts.values() {
            for direction in HexDirection::ALL {
                let Some(neighbor) = crypt.neighbor(direction) else {
                    continue;
                };
                let back = self
                    .crypts
                    .get(&neighbor)
                    .and_then(|n| n.neighbor(direction.opposite()));
                if back != Some(crypt.id()) {
                    return Err(TissueError::InvalidLayout {
                        reason: format!(
                            "crypt {} links {direction:?} to {neighbor} without a link back",
                            crypt.id()
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Look up a crypt.
    ///
    /// # Errors
    ///
    /// Returns [`TissueError::UnknownCrypt`] if the id is not in the grid.
    pub fn crypt(&self, id: CryptId) -> Result<&Crypt, TissueError> {
        self.crypts.get(&id).ok_or(TissueError::UnknownCrypt(id))
    }

    /// All crypts in row-major order.
    pub fn crypts(&self) -> impl Iterator<Item = &Crypt> {
        self.crypts.values()
    }

    /// Look up a cell, living or not.
    pub fn cell(&self, id: CellId) -> Option<&StemCell> {
        self.cells.get(&id)
    }

    /// Mutable access to a cell.
    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut StemCell> {
        self.cells.get_mut(&id)
    }

    /// Look up a cell only if it is still alive.
    pub fn living_cell(&self, id: CellId) -> Option<&StemCell> {
        self.cells.get(&id).filter(|cell| cell.is_alive())
    }

    /// All cells in ascending id order.
    pub fn cells(&self) -> impl Iterator<Item = &StemCell> {
        self.cells.values()
    }

    /// Number of cells in the tissue.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of crypts in the grid.
    pub fn crypt_count(&self) -> usize {
        self.crypts.len()
    }

    /// Number of cells in one crypt.
    ///
    /// # Errors
    ///
    /// Returns [`TissueError::UnknownCrypt`] if the id is not in the grid.
    pub fn population(&self, crypt: CryptId) -> Result<usize, TissueError> {
        Ok(self.crypt(crypt)?.population())
    }

    /// Whether a crypt holds at least one living cell. Unknown crypts are dead.
    pub fn crypt_is_alive(&self, crypt: CryptId) -> bool {
        self.crypts.get(&crypt).is_some_and(|c| {
            c.cells()
                .any(|cell| self.living_cell(cell).is_some())
        })
    }

    /// Whether any crypt is alive.
    pub fn is_alive(&self) -> bool {
        self.crypts.keys().any(|id| self.crypt_is_alive(*id))
    }

    /// Number of living crypts.
    pub fn living_crypts(&self) -> usize {
        self.crypts
            .keys()
            .filter(|id| self.crypt_is_alive(**id))
            .count()
    }

    /// Dead neighbors of a crypt, in slot order.
    ///
    /// # Errors
    ///
    /// Returns [`TissueError::UnknownCrypt`] if the id is not in the grid.
    pub fn dead_neighbors(&self, crypt: CryptId) -> Result<Vec<CryptId>, TissueError> {
        Ok(self
            .crypt(crypt)?
            .neighbors()
            .filter(|neighbor| !self.crypt_is_alive(*neighbor))
            .collect())
    }

    /// Whether any neighbor of a crypt is dead.
    ///
    /// # Errors
    ///
    /// Returns [`TissueError::UnknownCrypt`] if the id is not in the grid.
    pub fn has_dead_neighbor(&self, crypt: CryptId) -> Result<bool, TissueError> {
        Ok(self
            .crypt(crypt)?
            .neighbors()
            .any(|neighbor| !self.crypt_is_alive(neighbor)))
    }

    /// Cells in crypt order, then ascending id within each crypt.
    pub fn cells_in_grid_order(&self) -> Vec<CellId> {
        self.crypts.values().flat_map(Crypt::cells).collect()
    }

    // -------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------

    fn allocate_cell_id(&mut self) -> CellId {
        let id = self.next_cell;
        self.next_cell = id.next();
        id
    }

    /// Create a fresh cell in a crypt.
    ///
    /// # Errors
    ///
    /// Returns [`TissueError::UnknownCrypt`] if the id is not in the grid.
    pub fn add_cell(&mut self, crypt: CryptId) -> Result<CellId, TissueError> {
        if !self.crypts.contains_key(&crypt) {
            return Err(TissueError::UnknownCrypt(crypt));
        }
        let id = self.allocate_cell_id();
        self.attach(StemCell::new(id, crypt))?;
        Ok(id)
    }

    /// Create the daughter of `parent` and attach it to the parent's crypt.
    ///
    /// # Errors
    ///
    /// Returns [`TissueError::UnknownCell`] if the parent does not exist.
    pub fn add_daughter(&mut self, parent: CellId) -> Result<CellId, TissueError> {
        if !self.cells.contains_key(&parent) {
            return Err(TissueError::UnknownCell(parent));
        }
        let id = self.allocate_cell_id();
        let daughter = self
            .cells
            .get(&parent)
            .ok_or(TissueError::UnknownCell(parent))?
            .daughter(id);
        self.attach(daughter)?;
        Ok(id)
    }

    fn attach(&mut self, cell: StemCell) -> Result<(), TissueError> {
        let crypt = self
            .crypts
            .get_mut(&cell.crypt())
            .ok_or(TissueError::UnknownCrypt(cell.crypt()))?;
        crypt.insert(cell.id());
        self.cells.insert(cell.id(), cell);
        Ok(())
    }

    /// Kill a cell and remove it from its crypt and from the tissue.
    ///
    /// The dead cell is returned so the caller can release its pending
    /// events.
    ///
    /// # Errors
    ///
    /// Returns [`TissueError::UnknownCell`] if the cell does not exist, or
    /// [`TissueError::CellNotInCrypt`] if its crypt does not hold it.
    pub fn remove_cell(&mut self, id: CellId) -> Result<StemCell, TissueError> {
        let crypt_id = self
            .cells
            .get(&id)
            .ok_or(TissueError::UnknownCell(id))?
            .crypt();
        let crypt = self
            .crypts
            .get_mut(&crypt_id)
            .ok_or(TissueError::UnknownCrypt(crypt_id))?;
        if !crypt.remove(id) {
            return Err(TissueError::CellNotInCrypt {
                cell: id,
                crypt: crypt_id,
            });
        }
        let mut cell = self.cells.remove(&id).ok_or(TissueError::UnknownCell(id))?;
        cell.kill();
        Ok(cell)
    }

    /// Move `floor(population / 2)` cells from `source` into `target`,
    /// taking them in the source's iteration order.
    ///
    /// Returns the number of cells moved.
    ///
    /// # Errors
    ///
    /// Returns [`TissueError::UnknownCrypt`] if either crypt does not exist.
    pub fn move_half(&mut self, source: CryptId, target: CryptId) -> Result<usize, TissueError> {
        if !self.crypts.contains_key(&target) {
            return Err(TissueError::UnknownCrypt(target));
        }
        let source_crypt = self
            .crypts
            .get_mut(&source)
            .ok_or(TissueError::UnknownCrypt(source))?;
        let count = source_crypt.population() / 2;
        let moving: Vec<CellId> = source_crypt.cells().take(count).collect();
        for cell in &moving {
            source_crypt.remove(*cell);
        }

        let target_crypt = self
            .crypts
            .get_mut(&target)
            .ok_or(TissueError::UnknownCrypt(target))?;
        for cell in &moving {
            target_crypt.insert(*cell);
        }
        for cell in &moving {
            if let Some(cell) = self.cells.get_mut(cell) {
                cell.set_crypt(target);
            }
        }
        Ok(moving.len())
    }

    // -------------------------------------------------------------------
    // Tumor-suppressor bookkeeping
    // -------------------------------------------------------------------

    /// Record the first stem-compartment knockout in the tissue.
    ///
    /// Returns `true` if this call recorded it.
    pub fn record_tsg_stem(&mut self, cell: CellId, time: f64) -> bool {
        self.record_knockout(cell, time, TsgLocation::Stem, STEM_KNOCKOUT_HITS)
    }

    /// Record the first TAC-compartment knockout in the tissue.
    ///
    /// Returns `true` if this call recorded it.
    pub fn record_tsg_tac(&mut self, cell: CellId, time: f64) -> bool {
        self.record_knockout(cell, time, TsgLocation::Tac, TAC_KNOCKOUT_STEM_HITS)
    }

    fn record_knockout(
        &mut self,
        cell: CellId,
        time: f64,
        location: TsgLocation,
        min_stem_hits: u32,
    ) -> bool {
        if self.knockouts.iter().any(|k| k.location == location) {
            return false;
        }
        let Some(cell) = self.cells.get(&cell) else {
            return false;
        };
        if cell.tsg_hits() < min_stem_hits {
            return false;
        }
        self.knockouts.push(TsgKnockout {
            time,
            cell: cell.id(),
            crypt: cell.crypt(),
            location,
            stem_hits: cell.tsg_hits(),
            tac_hits: cell.tsg_hits_tac(),
        });
        true
    }

    /// Knockouts recorded so far (at most one per compartment).
    pub fn knockouts(&self) -> &[TsgKnockout] {
        &self.knockouts
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(tissue: &Tissue, row: u32, col: u32) -> Option<CryptId> {
        (row < tissue.rows && col < tissue.cols).then(|| tissue.position_id(row, col))
    }

    fn layout(rows: u32, cols: u32, wraparound: bool) -> LayoutParams {
        LayoutParams {
            rows,
            cols,
            wraparound,
        }
    }

    #[test]
    fn rejects_empty_grid() {
        assert!(matches!(
            Tissue::build(&layout(0, 3, false), 2),
            Err(TissueError::InvalidLayout { .. })
        ));
    }

    #[test]
    fn seeds_every_crypt() {
        let tissue = Tissue::build(&layout(2, 3, false), 4).unwrap();
        assert_eq!(tissue.crypt_count(), 6);
        assert_eq!(tissue.cell_count(), 24);
        for crypt in tissue.crypts() {
            assert_eq!(crypt.population(), 4);
        }
        assert!(tissue.is_alive());
        assert_eq!(tissue.living_crypts(), 6);
    }

    #[test]
    fn interior_crypt_has_six_neighbors() {
        let tissue = Tissue::build(&layout(3, 3, false), 1).unwrap();
        let center = at(&tissue, 1, 1).unwrap();
        let crypt = tissue.crypt(center).unwrap();
        assert_eq!(crypt.neighbors().count(), 6);
        // Odd row is shifted east.
        assert_eq!(crypt.neighbor(HexDirection::NorthEast), at(&tissue, 0, 2));
        assert_eq!(crypt.neighbor(HexDirection::NorthWest), at(&tissue, 0, 1));
        assert_eq!(crypt.neighbor(HexDirection::SouthWest), at(&tissue, 2, 1));
    }

    #[test]
    fn corner_without_wrap_has_few_neighbors() {
        let tissue = Tissue::build(&layout(3, 3, false), 1).unwrap();
        let corner = tissue.crypt(at(&tissue, 0, 0).unwrap()).unwrap();
        // East and south-east only.
        assert_eq!(corner.neighbors().count(), 2);
    }

    #[test]
    fn wraparound_joins_east_and_west_edges() {
        let tissue = Tissue::build(&layout(2, 4, true), 1).unwrap();
        let first = tissue.crypt(at(&tissue, 0, 0).unwrap()).unwrap();
        assert_eq!(first.neighbor(HexDirection::West), at(&tissue, 0, 3));
        assert_eq!(first.neighbor(HexDirection::SouthWest), at(&tissue, 1, 3));
        let last_odd = tissue.crypt(at(&tissue, 1, 3).unwrap()).unwrap();
        assert_eq!(last_odd.neighbor(HexDirection::NorthEast), at(&tissue, 0, 0));
        assert!(tissue.validate().is_ok());
    }

    #[test]
    fn single_crypt_has_no_neighbors() {
        let tissue = Tissue::build(&layout(1, 1, true), 3).unwrap();
        let only = tissue.crypt(CryptId::new(0)).unwrap();
        assert_eq!(only.neighbors().count(), 0);
    }

    #[test]
    fn dead_neighbors_follow_population() {
        let mut tissue = Tissue::build(&layout(1, 2, false), 1).unwrap();
        let left = CryptId::new(0);
        let right = CryptId::new(1);
        assert!(!tissue.has_dead_neighbor(left).unwrap());

        let victim = tissue.crypt(right).unwrap().cells().next().unwrap();
        let dead = tissue.remove_cell(victim).unwrap();
        assert!(!dead.is_alive());
        assert!(!tissue.crypt_is_alive(right));
        assert_eq!(tissue.dead_neighbors(left).unwrap(), vec![right]);
    }

    #[test]
    fn remove_cell_detects_missing_membership() {
        let mut tissue = Tissue::build(&layout(1, 1, false), 1).unwrap();
        let cell = tissue.cells_in_grid_order().into_iter().next().unwrap();
        tissue.crypts.get_mut(&CryptId::new(0)).unwrap().remove(cell);
        assert!(matches!(
            tissue.remove_cell(cell),
            Err(TissueError::CellNotInCrypt { .. })
        ));
    }

    #[test]
    fn move_half_moves_lowest_ids() {
        let mut tissue = Tissue::build(&layout(1, 2, false), 5).unwrap();
        let source = CryptId::new(0);
        let target = CryptId::new(1);
        for cell in tissue.crypt(target).unwrap().cells().collect::<Vec<_>>() {
            tissue.remove_cell(cell).unwrap();
        }

        let moved = tissue.move_half(source, target).unwrap();
        assert_eq!(moved, 2);
        assert_eq!(tissue.population(source).unwrap(), 3);
        let moved_ids: Vec<_> = tissue.crypt(target).unwrap().cells().collect();
        assert_eq!(moved_ids, vec![CellId::new(0), CellId::new(1)]);
        for cell in moved_ids {
            assert_eq!(tissue.cell(cell).unwrap().crypt(), target);
        }
    }

    #[test]
    fn daughter_joins_parent_crypt() {
        let mut tissue = Tissue::build(&layout(1, 1, false), 1).unwrap();
        let parent = CellId::new(0);
        let daughter = tissue.add_daughter(parent).unwrap();
        assert_ne!(parent, daughter);
        assert_eq!(tissue.population(CryptId::new(0)).unwrap(), 2);
    }

    #[test]
    fn failed_daughter_keeps_id_sequence() {
        let mut tissue = Tissue::build(&layout(1, 1, false), 1).unwrap();
        assert!(matches!(
            tissue.add_daughter(CellId::new(7)),
            Err(TissueError::UnknownCell(_))
        ));
        assert_eq!(tissue.add_daughter(CellId::new(0)).unwrap(), CellId::new(1));
        assert_eq!(tissue.add_cell(CryptId::new(0)).unwrap(), CellId::new(2));
    }

    #[test]
    fn knockouts_are_recorded_once_per_compartment() {
        let mut tissue = Tissue::build(&layout(1, 1, false), 2).unwrap();
        let cell = CellId::new(0);

        assert!(!tissue.record_tsg_tac(cell, 1.0));
        tissue.cell_mut(cell).unwrap().tsg_hit();
        assert!(tissue.record_tsg_tac(cell, 2.0));
        assert!(!tissue.record_tsg_tac(cell, 3.0));

        assert!(!tissue.record_tsg_stem(cell, 4.0));
        tissue.cell_mut(cell).unwrap().tsg_hit();
        assert!(tissue.record_tsg_stem(cell, 5.0));
        assert_eq!(tissue.knockouts().len(), 2);
    }
}
