//! Mutable state of one simulation run.

use stemsim_tissue::{MutationCatalog, Tissue, TissueParams};
use stemsim_types::EventId;
use tracing::debug;

use crate::config::{EventFloors, SimulationConfig};
use crate::error::SimulationError;
use crate::queue::EventQueue;
use crate::random::{RandomSource, SeededRandom};
use crate::schedule;

/// Everything a run mutates: the tissue, the pending events, and the
/// random stream, plus the parameters they are read against.
pub struct SimulationState {
    /// The crypt grid and every living cell.
    pub tissue: Tissue,
    /// Pending events.
    pub queue: EventQueue,
    /// Biological parameters.
    pub params: TissueParams,
    /// Minimum waits added to sampled event times.
    pub floors: EventFloors,
    /// Shared mutation descriptors and their class probabilities.
    pub catalog: MutationCatalog,
    /// The run's only source of randomness.
    pub rng: Box<dyn RandomSource>,
    /// Time of the most recently executed event.
    pub current_time: f64,
    next_event: EventId,
}

impl SimulationState {
    /// Wrap an already-built tissue. No events are scheduled.
    pub fn new(
        tissue: Tissue,
        params: TissueParams,
        floors: EventFloors,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        let catalog = MutationCatalog::from_params(&params.mutation);
        Self {
            tissue,
            queue: EventQueue::new(),
            params,
            floors,
            catalog,
            rng,
            current_time: 0.0,
            next_event: EventId::new(0),
        }
    }

    /// Build the tissue described by `config`, seed the random stream, and
    /// schedule every cell's initial events at time zero.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Tissue`] if the layout is invalid, or any
    /// error raised while scheduling the initial events.
    pub fn from_config(config: &SimulationConfig, seed: u64) -> Result<Self, SimulationError> {
        let params = config.tissue_params();
        let tissue = Tissue::build(&params.tissue, params.crypt.mean_cells)?;
        let mut state = Self::new(
            tissue,
            params,
            config.events,
            Box::new(SeededRandom::from_seed(seed)),
        );
        schedule::seed_initial_events(&mut state)?;
        debug!(
            seed,
            cells = state.tissue.cell_count(),
            crypts = state.tissue.crypt_count(),
            events = state.queue.len(),
            "Simulation state initialized"
        );
        Ok(state)
    }

    /// Hand out the next event id.
    pub const fn allocate_event_id(&mut self) -> EventId {
        let id = self.next_event;
        self.next_event = id.next();
        id
    }
}

impl std::fmt::Debug for SimulationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationState")
            .field("cells", &self.tissue.cell_count())
            .field("crypts", &self.tissue.crypt_count())
            .field("queued", &self.queue.len())
            .field("current_time", &self.current_time)
            .field("next_event", &self.next_event)
            .finish_non_exhaustive()
    }
}

/// A small state for unit tests: a `rows x cols` grid without wraparound,
/// `mean_cells` cells per crypt, standard deviation 1, an apoptosis floor of
/// zero and a division floor of one. No events are scheduled.
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) fn test_state(
    rows: u32,
    cols: u32,
    mean_cells: u32,
    rng: impl RandomSource + 'static,
) -> SimulationState {
    let mut params = TissueParams::default();
    params.tissue = stemsim_tissue::LayoutParams {
        rows,
        cols,
        wraparound: false,
    };
    params.crypt.mean_cells = mean_cells;
    params.crypt.standard_deviation = 1;
    let tissue = Tissue::build(&params.tissue, mean_cells).unwrap();
    SimulationState::new(
        tissue,
        params,
        EventFloors {
            apoptosis_floor: 0.0,
            cell_division_floor: 1.0,
        },
        Box::new(rng),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn from_config_seeds_initial_events() {
        let mut config = SimulationConfig::default();
        config.tissue.rows = 2;
        config.tissue.cols = 2;
        config.crypt.mean_cells = 3;
        let state = SimulationState::from_config(&config, 7).unwrap();
        assert_eq!(state.tissue.cell_count(), 12);
        // Feedback apoptosis is suppressed at the homeostatic mean.
        assert_eq!(state.queue.len(), 12 * 3);
    }

    #[test]
    fn event_ids_are_sequential() {
        let mut state = test_state(1, 1, 1, crate::random::StubRandom::default());
        assert_eq!(state.allocate_event_id(), EventId::new(0));
        assert_eq!(state.allocate_event_id(), EventId::new(1));
    }
}
