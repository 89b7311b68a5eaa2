//! End-of-run census of the stem-cell population.
//!
//! [`CensusObserver`] waits for the end event and counts what is left:
//! living cells and crypts, the cells carrying a mutator mutation, the
//! crypts holding at least one of them, and the mutations carried overall.

use serde::Serialize;
use stemsim_core::{EventObserver, SimEvent};
use stemsim_tissue::Tissue;
use tracing::info;

/// Population and mutation counts of a tissue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Census {
    /// Living stem cells.
    pub living_cells: usize,
    /// Crypts with at least one living cell.
    pub living_crypts: usize,
    /// Living cells carrying at least one mutator mutation.
    pub mutator_cells: usize,
    /// Crypts holding at least one mutator cell.
    pub mutator_crypts: usize,
    /// Mutations carried by all living cells, summarized ones included.
    pub mutations_carried: usize,
}

impl Census {
    /// Count the tissue as it stands.
    pub fn take(tissue: &Tissue) -> Self {
        let mut census = Self {
            living_crypts: tissue.living_crypts(),
            ..Self::default()
        };
        for crypt in tissue.crypts() {
            let mut has_mutator = false;
            for cell in crypt.cells().filter_map(|id| tissue.living_cell(id)) {
                let load = cell.mutations();
                census.living_cells = census.living_cells.saturating_add(1);
                census.mutations_carried = census.mutations_carried.saturating_add(load.total());
                if load.is_mutator() {
                    census.mutator_cells = census.mutator_cells.saturating_add(1);
                    has_mutator = true;
                }
            }
            if has_mutator {
                census.mutator_crypts = census.mutator_crypts.saturating_add(1);
            }
        }
        census
    }
}

/// Observer that takes a [`Census`] when the end event arrives.
#[derive(Debug, Default)]
pub struct CensusObserver {
    census: Option<Census>,
}

impl CensusObserver {
    /// An observer that has not seen the end of a run yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// The census, once the run has ended.
    pub const fn census(&self) -> Option<Census> {
        self.census
    }
}

impl EventObserver for CensusObserver {
    fn on_event(&mut self, event: &SimEvent, tissue: &Tissue) {
        if !event.is_end() {
            return;
        }
        let census = Census::take(tissue);
        info!(
            time = event.time,
            living_cells = census.living_cells,
            living_crypts = census.living_crypts,
            mutator_cells = census.mutator_cells,
            mutator_crypts = census.mutator_crypts,
            mutations_carried = census.mutations_carried,
            "End-of-run census"
        );
        self.census = Some(census);
    }
}
