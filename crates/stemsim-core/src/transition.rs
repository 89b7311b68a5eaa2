//! Event execution: what each kind of event does to the tissue.
//!
//! [`execute`] is called by the driver for every valid event it pops. An
//! event whose subject is already gone (a cell that died, a crypt that
//! emptied) is a no-op with outcome [`EventOutcome::Skipped`].

use stemsim_tissue::{EventSlot, TissueError, rates};
use stemsim_types::{CellId, CryptId, MutationClass};
use tracing::{debug, info, trace};

use crate::cascade;
use crate::error::SimulationError;
use crate::event::{EventKind, EventOutcome, SimEvent};
use crate::schedule;
use crate::state::SimulationState;

/// Apply an event to the simulation state.
///
/// # Errors
///
/// Returns [`SimulationError::DoomedDivision`] or
/// [`SimulationError::InvariantViolation`] if the tissue's bookkeeping is
/// inconsistent, or any error raised while scheduling follow-up events.
pub fn execute(
    state: &mut SimulationState,
    event: &SimEvent,
) -> Result<EventOutcome, SimulationError> {
    let now = event.time;
    match event.kind {
        EventKind::SimulationStart | EventKind::SimulationEnd => Ok(EventOutcome::Sentinel),
        EventKind::Apoptosis(cell) | EventKind::FeedbackApoptosis(cell) => {
            apoptosis(state, cell, now)
        }
        EventKind::SymmetricDivision(cell) => symmetric_division(state, cell, event),
        EventKind::AsymmetricDivision(cell) => asymmetric_division(state, cell, now),
        EventKind::CryptBifurcation(crypt) => bifurcation(state, crypt, now),
    }
}

// ---------------------------------------------------------------------------
// Cell death
// ---------------------------------------------------------------------------

fn apoptosis(
    state: &mut SimulationState,
    cell: CellId,
    now: f64,
) -> Result<EventOutcome, SimulationError> {
    if state.tissue.living_cell(cell).is_none() {
        trace!(%cell, time = now, "Apoptosis of a dead cell skipped");
        return Ok(EventOutcome::Skipped);
    }

    let mut dead = state.tissue.remove_cell(cell).map_err(|source| match source {
        TissueError::CellNotInCrypt { .. } => SimulationError::InvariantViolation {
            reason: source.to_string(),
        },
        other => other.into(),
    })?;
    for id in dead.pending_mut().take_all() {
        state.queue.cancel(id);
    }

    let crypt = dead.crypt();
    debug!(%cell, %crypt, time = now, "Cell died");
    cascade::on_population_change(state, crypt, now)?;
    Ok(EventOutcome::CellDied { cell, crypt })
}

// ---------------------------------------------------------------------------
// Division
// ---------------------------------------------------------------------------

fn symmetric_division(
    state: &mut SimulationState,
    cell: CellId,
    event: &SimEvent,
) -> Result<EventOutcome, SimulationError> {
    let now = event.time;
    let Some(subject) = state.tissue.living_cell(cell) else {
        trace!(%cell, time = now, "Division of a dead cell skipped");
        return Ok(EventOutcome::Skipped);
    };
    let crypt = subject.crypt();

    let death_time = [EventSlot::Apoptosis, EventSlot::FeedbackApoptosis]
        .into_iter()
        .filter_map(|slot| subject.pending().get(slot))
        .filter_map(|id| state.queue.time_of(id))
        .fold(f64::INFINITY, f64::min);
    if death_time < now {
        return Err(SimulationError::DoomedDivision {
            cell,
            event: event.id,
            division_time: now,
            death_time,
        });
    }

    let daughter = state.tissue.add_daughter(cell)?;

    mutation_check(state, cell)?;
    mutation_check(state, daughter)?;
    tsg_check(state, cell, now)?;
    tsg_check(state, daughter, now)?;

    schedule::clear_cell_events(state, cell);
    schedule::clear_cell_events(state, daughter);
    schedule::apoptosis(state, cell, now)?;
    schedule::apoptosis(state, daughter, now)?;
    schedule::asymmetric_division(state, cell, now)?;
    schedule::asymmetric_division(state, daughter, now)?;

    debug!(parent = %cell, %daughter, %crypt, time = now, "Cell divided");
    cascade::on_population_change(state, crypt, now)?;
    Ok(EventOutcome::CellDivided {
        parent: cell,
        daughter,
        crypt,
    })
}

fn asymmetric_division(
    state: &mut SimulationState,
    cell: CellId,
    now: f64,
) -> Result<EventOutcome, SimulationError> {
    if state.tissue.living_cell(cell).is_none() {
        trace!(%cell, time = now, "Asymmetric division of a dead cell skipped");
        return Ok(EventOutcome::Skipped);
    }

    tsg_check(state, cell, now)?;
    mutation_check(state, cell)?;

    // The slot still names the event being executed, which is no longer queued.
    if let Some(subject) = state.tissue.cell_mut(cell) {
        subject.pending_mut().take(EventSlot::AsymmetricDivision);
    }
    schedule::asymmetric_division(state, cell, now)?;
    Ok(EventOutcome::CellRenewed { cell })
}

/// Roll for a fitness mutation and, on a hit, give the cell one drawn from
/// the run's catalog.
///
/// Returns the class acquired, if any.
///
/// # Errors
///
/// Returns [`SimulationError::Tissue`] if the cell is not alive.
pub fn mutation_check(
    state: &mut SimulationState,
    cell: CellId,
) -> Result<Option<MutationClass>, SimulationError> {
    let subject = state
        .tissue
        .living_cell(cell)
        .ok_or(TissueError::UnknownCell(cell))?;
    let rate = rates::mutation_rate(&state.tissue, subject, &state.params);
    if state.rng.uniform01() > rate {
        return Ok(None);
    }

    let draw = state.rng.uniform01();
    let Some(effect) = state.catalog.draw(draw) else {
        return Ok(None);
    };
    let summarize = state.params.mutation.summarize;
    state
        .tissue
        .cell_mut(cell)
        .ok_or(TissueError::UnknownCell(cell))?
        .add_mutation(effect, summarize);
    trace!(%cell, class = ?effect.class(), "Mutation acquired");
    Ok(Some(effect.class()))
}

/// Roll for tumor-suppressor hits in the stem cell and in its
/// transit-amplifying progeny.
///
/// A stem hit that takes the cell to the cancer threshold schedules the
/// end of the run at `now`. TAC hits are only recorded.
///
/// # Errors
///
/// Returns [`SimulationError::Tissue`] if the cell is not alive.
pub fn tsg_check(
    state: &mut SimulationState,
    cell: CellId,
    now: f64,
) -> Result<(), SimulationError> {
    let subject = state
        .tissue
        .living_cell(cell)
        .ok_or(TissueError::UnknownCell(cell))?;
    let stem_probability = rates::tsg_mutation_rate(&state.tissue, subject, &state.params);
    let transient = rates::transient_cells(&state.tissue, subject, &state.params)?;
    let tac_probability = 1.0 - (1.0 - stem_probability).powf(f64::from(transient));

    if state.rng.uniform01() <= stem_probability {
        let subject = state
            .tissue
            .cell_mut(cell)
            .ok_or(TissueError::UnknownCell(cell))?;
        subject.tsg_hit();
        let hits = subject.tsg_hits();
        let cancerous = subject.is_cancerous(state.params.cancer.tsg_threshold);
        debug!(%cell, hits, time = now, "Stem TSG hit");

        if state.tissue.record_tsg_stem(cell, now) {
            info!(%cell, time = now, "First stem TSG knockout");
        }
        if cancerous {
            info!(%cell, hits, time = now, "Cell reached the TSG cancer threshold");
            schedule::end(state, now)?;
        }
    }

    if state.rng.uniform01() <= tac_probability {
        state
            .tissue
            .cell_mut(cell)
            .ok_or(TissueError::UnknownCell(cell))?
            .tsg_hit_tac();
        debug!(%cell, transient, time = now, "TAC TSG hit");
        if state.tissue.record_tsg_tac(cell, now) {
            info!(%cell, time = now, "First TAC TSG knockout");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Bifurcation
// ---------------------------------------------------------------------------

fn bifurcation(
    state: &mut SimulationState,
    crypt: CryptId,
    now: f64,
) -> Result<EventOutcome, SimulationError> {
    if !state.tissue.crypt_is_alive(crypt) {
        trace!(%crypt, time = now, "Bifurcation of a dead crypt skipped");
        return Ok(EventOutcome::Skipped);
    }
    let dead = state.tissue.dead_neighbors(crypt)?;
    let Some(index) = state.rng.index(dead.len()) else {
        trace!(%crypt, time = now, "Bifurcation without a dead neighbor skipped");
        return Ok(EventOutcome::Skipped);
    };
    let target = *dead
        .get(index)
        .ok_or_else(|| SimulationError::InvariantViolation {
            reason: format!("neighbor index {index} out of {} dead neighbors", dead.len()),
        })?;

    let moved = state.tissue.move_half(crypt, target)?;
    info!(source = %crypt, daughter = %target, moved, time = now, "Crypt bifurcated");

    cascade::on_population_change(state, crypt, now)?;
    cascade::on_population_change(state, target, now)?;
    Ok(EventOutcome::CryptBifurcated {
        source: crypt,
        daughter: target,
        moved,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use stemsim_types::EventId;

    use super::*;
    use crate::random::StubRandom;
    use crate::state::test_state;

    fn cell_event(kind: EventKind, time: f64) -> SimEvent {
        SimEvent::new(EventId::new(u64::MAX), kind, time, time)
    }

    /// Pop a cell's pending event of `slot` out of the queue, as the driver would.
    fn pop_pending(state: &mut SimulationState, cell: CellId, slot: EventSlot) -> SimEvent {
        let id = state.tissue.cell(cell).unwrap().pending().get(slot).unwrap();
        let event = state.queue.get(id).cloned().unwrap();
        assert!(state.queue.remove(id));
        event
    }

    #[test]
    fn apoptosis_removes_cell_and_its_events() {
        let mut state = test_state(1, 1, 3, StubRandom::default());
        schedule::seed_initial_events(&mut state).unwrap();
        let cell = CellId::new(0);
        let event = pop_pending(&mut state, cell, EventSlot::Apoptosis);

        let outcome = execute(&mut state, &event).unwrap();
        assert_eq!(
            outcome,
            EventOutcome::CellDied {
                cell,
                crypt: CryptId::new(0)
            }
        );
        assert!(state.tissue.cell(cell).is_none());
        assert_eq!(state.tissue.population(CryptId::new(0)).unwrap(), 2);
        assert!(state.queue.iter().all(|e| e.kind.cell() != Some(cell)));

        assert_eq!(execute(&mut state, &event).unwrap(), EventOutcome::Skipped);
    }

    #[test]
    fn symmetric_division_adds_a_scheduled_daughter() {
        let mut state = test_state(1, 1, 2, StubRandom::default());
        schedule::seed_initial_events(&mut state).unwrap();
        let parent = CellId::new(0);
        let event = cell_event(EventKind::SymmetricDivision(parent), 1.0);

        let outcome = execute(&mut state, &event).unwrap();
        let EventOutcome::CellDivided { daughter, crypt, .. } = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert_eq!(daughter, CellId::new(2));
        assert_eq!(state.tissue.population(crypt).unwrap(), 3);

        // Three cells above a mean of two: every slot of every cell is filled.
        for cell in state.tissue.cells() {
            for slot in EventSlot::ALL {
                let id = cell.pending().get(slot).unwrap();
                assert!(state.queue.contains(id), "{:?} {slot:?}", cell.id());
            }
        }
        assert_eq!(state.queue.len(), 12);
    }

    #[test]
    fn division_of_a_doomed_cell_is_an_error() {
        let mut state = test_state(1, 1, 2, StubRandom::default());
        schedule::seed_initial_events(&mut state).unwrap();
        let cell = CellId::new(0);
        let apoptosis = state
            .tissue
            .cell(cell)
            .unwrap()
            .pending()
            .get(EventSlot::Apoptosis)
            .unwrap();
        state.queue.reschedule(apoptosis, 0.5).unwrap();

        let event = cell_event(EventKind::SymmetricDivision(cell), 1.0);
        assert!(matches!(
            execute(&mut state, &event),
            Err(SimulationError::DoomedDivision { .. })
        ));
    }

    #[test]
    fn asymmetric_division_renews_its_own_event() {
        let mut state = test_state(1, 1, 2, StubRandom::default());
        schedule::seed_initial_events(&mut state).unwrap();
        let cell = CellId::new(0);
        let event = pop_pending(&mut state, cell, EventSlot::AsymmetricDivision);
        let queued = state.queue.len();

        let outcome = execute(&mut state, &event).unwrap();
        assert_eq!(outcome, EventOutcome::CellRenewed { cell });
        let renewed = state
            .tissue
            .cell(cell)
            .unwrap()
            .pending()
            .get(EventSlot::AsymmetricDivision)
            .unwrap();
        assert_ne!(renewed, event.id);
        assert!(state.queue.time_of(renewed).unwrap() > event.time);
        assert_eq!(state.queue.len(), queued + 1);
        assert_eq!(state.tissue.population(CryptId::new(0)).unwrap(), 2);
    }

    #[test]
    fn certain_hits_mutate_and_reach_the_cancer_threshold() {
        let mut state = test_state(1, 1, 2, StubRandom::new(0.0));
        state.params.cancer.tsg_threshold = 2;
        schedule::seed_initial_events(&mut state).unwrap();
        let cell = CellId::new(0);

        let first = pop_pending(&mut state, cell, EventSlot::AsymmetricDivision);
        execute(&mut state, &first).unwrap();
        let subject = state.tissue.cell(cell).unwrap();
        assert_eq!(subject.tsg_hits(), 1);
        assert_eq!(subject.tsg_hits_tac(), 1);
        assert_eq!(
            subject.mutations().count(MutationClass::DeleteriousApoptosis),
            1
        );
        assert!(state.queue.iter().all(|e| !e.is_end()));
        assert_eq!(state.tissue.knockouts().len(), 1);

        let second = pop_pending(&mut state, cell, EventSlot::AsymmetricDivision);
        execute(&mut state, &second).unwrap();
        assert_eq!(state.tissue.cell(cell).unwrap().tsg_hits(), 2);
        let end = state.queue.iter().find(|e| e.is_end()).unwrap();
        assert_eq!(end.time, second.time);
        assert_eq!(state.tissue.knockouts().len(), 2);
    }

    #[test]
    fn bifurcation_fills_the_dead_neighbor() {
        let mut state = test_state(1, 2, 2, StubRandom::default());
        let left = CryptId::new(0);
        let right = CryptId::new(1);
        for cell in state.tissue.crypt(right).unwrap().cells().collect::<Vec<_>>() {
            state.tissue.remove_cell(cell).unwrap();
        }
        for _ in 0..2 {
            state.tissue.add_cell(left).unwrap();
        }
        schedule::seed_initial_events(&mut state).unwrap();

        let event = cell_event(EventKind::CryptBifurcation(left), 2.0);
        let outcome = execute(&mut state, &event).unwrap();
        assert_eq!(
            outcome,
            EventOutcome::CryptBifurcated {
                source: left,
                daughter: right,
                moved: 2
            }
        );
        assert_eq!(state.tissue.population(left).unwrap(), 2);
        assert_eq!(state.tissue.population(right).unwrap(), 2);
        assert!(state.tissue.crypt_is_alive(right));

        assert_eq!(execute(&mut state, &event).unwrap(), EventOutcome::Skipped);
    }
}
