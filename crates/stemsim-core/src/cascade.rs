//! Crypt-wide rescheduling after a population change.
//!
//! Any birth, death, or bifurcation changes the pressure a crypt puts on
//! its cells, so every cell's feedback apoptosis and symmetric division are
//! redrawn. A division already close to firing keeps its time.

use stemsim_tissue::{EventSlot, rates};
use stemsim_types::{CellId, CryptId};
use tracing::{info, trace};

use crate::error::SimulationError;
use crate::schedule;
use crate::state::SimulationState;

/// Reschedule a crypt after its population changed at `now`.
///
/// 1. A cancerous crypt ends the run at `now` and nothing else happens.
/// 2. Each living cell gets a fresh feedback apoptosis, and a fresh
///    symmetric division unless one of its divisions is impending.
/// 3. A crypt at or above the bifurcation threshold with a dead neighbor
///    gets a bifurcation at `now`.
///
/// # Errors
///
/// Returns [`SimulationError::Tissue`] if the crypt is unknown, or any
/// error raised while scheduling.
pub fn on_population_change(
    state: &mut SimulationState,
    crypt: CryptId,
    now: f64,
) -> Result<(), SimulationError> {
    if rates::is_cancerous(&state.tissue, crypt, &state.params)? {
        let population = state.tissue.population(crypt)?;
        info!(%crypt, population, time = now, "Crypt growth out of control");
        schedule::end(state, now)?;
        return Ok(());
    }

    let cells: Vec<CellId> = state.tissue.crypt(crypt)?.cells().collect();
    for cell in cells {
        if state.tissue.living_cell(cell).is_none() {
            continue;
        }
        schedule::feedback_apoptosis(state, cell, now)?;
        if has_impending_division(state, cell, now) {
            trace!(%cell, time = now, "Impending division kept");
            continue;
        }
        schedule::symmetric_division(state, cell, now)?;
    }

    if state.tissue.population(crypt)? >= rates::bifurcation_threshold(&state.params)
        && state.tissue.has_dead_neighbor(crypt)?
    {
        schedule::bifurcation(state, crypt, now)?;
    }
    Ok(())
}

/// Whether a cell's symmetric or asymmetric division is due within one
/// division floor of `now`.
pub fn has_impending_division(state: &SimulationState, cell: CellId, now: f64) -> bool {
    let Some(subject) = state.tissue.cell(cell) else {
        return false;
    };
    let floor = state.floors.cell_division_floor;
    [EventSlot::SymmetricDivision, EventSlot::AsymmetricDivision]
        .into_iter()
        .filter_map(|slot| subject.pending().get(slot))
        .filter_map(|id| state.queue.time_of(id))
        .any(|time| time - now < floor)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::random::StubRandom;
    use crate::state::test_state;

    fn slot_id(state: &SimulationState, cell: CellId, slot: EventSlot) -> stemsim_types::EventId {
        state.tissue.cell(cell).unwrap().pending().get(slot).unwrap()
    }

    #[test]
    fn cancerous_crypt_only_ends_the_run() {
        let mut state = test_state(1, 1, 2, StubRandom::default());
        let crypt = CryptId::new(0);
        // Threshold is round(2 x 4) = 8.
        for _ in 0..7 {
            state.tissue.add_cell(crypt).unwrap();
        }
        on_population_change(&mut state, crypt, 5.0).unwrap();

        assert_eq!(state.queue.len(), 1);
        let end = state.queue.peek().unwrap();
        assert!(end.is_end());
        assert_eq!(end.time, 5.0);
    }

    #[test]
    fn impending_divisions_are_not_redrawn() {
        let mut state = test_state(1, 1, 2, StubRandom::default());
        schedule::seed_initial_events(&mut state).unwrap();
        let close = CellId::new(0);
        let far = CellId::new(1);

        // Asymmetric divisions sit at 11; symmetric ones at 101.
        let close_symmetric = slot_id(&state, close, EventSlot::SymmetricDivision);
        state.queue.reschedule(close_symmetric, 10.8).unwrap();
        let far_symmetric = slot_id(&state, far, EventSlot::SymmetricDivision);
        assert!(has_impending_division(&state, close, 10.0));
        assert!(!has_impending_division(&state, far, 10.0));

        on_population_change(&mut state, CryptId::new(0), 10.0).unwrap();

        assert_eq!(
            slot_id(&state, close, EventSlot::SymmetricDivision),
            close_symmetric
        );
        let redrawn = slot_id(&state, far, EventSlot::SymmetricDivision);
        assert_ne!(redrawn, far_symmetric);
        assert!(!state.queue.contains(far_symmetric));
        assert_eq!(state.queue.time_of(redrawn).unwrap(), 111.0);
    }

    #[test]
    fn crowded_crypt_next_to_a_dead_one_bifurcates() {
        let mut state = test_state(1, 2, 2, StubRandom::default());
        let left = CryptId::new(0);
        let right = CryptId::new(1);
        for cell in state.tissue.crypt(right).unwrap().cells().collect::<Vec<_>>() {
            state.tissue.remove_cell(cell).unwrap();
        }
        on_population_change(&mut state, left, 3.0).unwrap();
        assert!(
            state
                .queue
                .iter()
                .all(|e| e.kind != EventKind::CryptBifurcation(left))
        );

        for _ in 0..2 {
            state.tissue.add_cell(left).unwrap();
        }
        on_population_change(&mut state, left, 4.0).unwrap();
        let bifurcation = state
            .queue
            .iter()
            .find(|e| e.kind == EventKind::CryptBifurcation(left))
            .unwrap();
        assert_eq!(bifurcation.time, 4.0);
    }
}
