//! Run statistics gathered from the event stream.
//!
//! [`RunStatsObserver`] is registered with the driver for every replicate
//! and tallies what it sees; the engine folds the tallies into the run's
//! summary line.

use std::collections::BTreeMap;

use serde::Serialize;
use stemsim_core::{EventObserver, EventOutcome, SimEvent};
use stemsim_tissue::Tissue;
use stemsim_types::EventType;
use tracing::debug;

/// Counters for one replicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Executed events per type, sentinels included.
    pub events_by_type: BTreeMap<EventType, u64>,
    /// Executed events whose subject was already gone.
    pub skipped: u64,
    /// Cells that died.
    pub deaths: u64,
    /// Symmetric divisions that produced a daughter.
    pub divisions: u64,
    /// Crypts repopulated by bifurcation.
    pub bifurcations: u64,
    /// Largest living-cell count seen.
    pub peak_cells: usize,
    /// Largest living-crypt count seen.
    pub peak_crypts: usize,
}

/// Observer that accumulates [`RunStats`].
#[derive(Debug, Default)]
pub struct RunStatsObserver {
    stats: RunStats,
}

impl RunStatsObserver {
    /// A fresh observer with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// The counters so far.
    pub const fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Consume the observer and return its counters.
    pub fn into_stats(self) -> RunStats {
        self.stats
    }
}

impl EventObserver for RunStatsObserver {
    fn on_event(&mut self, event: &SimEvent, tissue: &Tissue) {
        self.stats.peak_cells = self.stats.peak_cells.max(tissue.cell_count());
        self.stats.peak_crypts = self.stats.peak_crypts.max(tissue.living_crypts());

        let Some(outcome) = event.outcome else {
            return;
        };
        let count = self
            .stats
            .events_by_type
            .entry(event.event_type())
            .or_insert(0);
        *count = count.saturating_add(1);

        match outcome {
            EventOutcome::Skipped => self.stats.skipped = self.stats.skipped.saturating_add(1),
            EventOutcome::CellDied { .. } => {
                self.stats.deaths = self.stats.deaths.saturating_add(1);
            }
            EventOutcome::CellDivided { .. } => {
                self.stats.divisions = self.stats.divisions.saturating_add(1);
            }
            EventOutcome::CryptBifurcated {
                source,
                daughter,
                moved,
            } => {
                self.stats.bifurcations = self.stats.bifurcations.saturating_add(1);
                debug!(%source, %daughter, moved, time = event.time, "Bifurcation observed");
            }
            EventOutcome::Sentinel | EventOutcome::CellRenewed { .. } => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stemsim_core::{SimulationConfig, SimulationState, run_simulation};

    use super::*;

    #[test]
    fn counts_match_the_driver() {
        let mut config = SimulationConfig::default();
        config.tissue.rows = 2;
        config.tissue.cols = 2;
        config.crypt.mean_cells = 3;
        config.simulation.duration = 100.0;

        let mut state = SimulationState::from_config(&config, 23).unwrap();
        let initial_cells = state.tissue.cell_count();
        let mut observer = RunStatsObserver::new();
        let result = run_simulation(&mut state, &config.simulation, &mut observer).unwrap();
        let stats = observer.into_stats();

        let counted: u64 = stats.events_by_type.values().sum();
        assert_eq!(counted, result.events_executed);
        assert_eq!(stats.events_by_type.get(&EventType::SimulationStart), Some(&1));
        assert!(stats.peak_cells >= initial_cells);
        assert!(stats.peak_cells >= result.living_cells);
        assert!(stats.peak_crypts >= result.living_crypts);
    }

    #[test]
    fn unexecuted_events_are_not_counted() {
        let tissue = Tissue::build(&stemsim_tissue::LayoutParams::default(), 2).unwrap();
        let mut observer = RunStatsObserver::new();
        observer.on_event(
            &SimEvent::end(stemsim_types::EventId::new(0), 4.0),
            &tissue,
        );
        assert!(observer.stats().events_by_type.is_empty());
        assert_eq!(observer.stats().peak_cells, 32);
        assert_eq!(observer.stats().peak_crypts, 16);
    }
}
