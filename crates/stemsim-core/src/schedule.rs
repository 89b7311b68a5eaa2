//! Event generators.
//!
//! Each generator reads the subject's current rate from the rate model,
//! draws an exponential wait, adds the configured floor, and files the new
//! event in the subject's pending slot. Whatever the slot held before is
//! cancelled first, so a cell never has more than one queued event of a
//! kind.

use stemsim_tissue::{EventSlot, StemCell, TissueError, rates};
use stemsim_types::{CellId, CryptId, EventId};
use tracing::trace;

use crate::error::SimulationError;
use crate::event::{EventKind, SimEvent};
use crate::state::SimulationState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn living(state: &SimulationState, cell: CellId) -> Result<&StemCell, SimulationError> {
    Ok(state
        .tissue
        .living_cell(cell)
        .ok_or(TissueError::UnknownCell(cell))?)
}

/// `now + Exp(rate) + floor`.
fn sample_time(
    state: &mut SimulationState,
    rate: f64,
    floor: f64,
    now: f64,
) -> Result<f64, SimulationError> {
    let wait = state.rng.exponential(rate)?;
    Ok(now + wait + floor)
}

/// Cancel whatever event a slot holds and leave it empty.
pub fn release(state: &mut SimulationState, cell: CellId, slot: EventSlot) -> Option<SimEvent> {
    let previous = state.tissue.cell_mut(cell)?.pending_mut().take(slot)?;
    state.queue.cancel(previous)
}

/// Cancel every pending event of a cell.
pub fn clear_cell_events(state: &mut SimulationState, cell: CellId) {
    let Some(held) = state
        .tissue
        .cell_mut(cell)
        .map(|c| c.pending_mut().take_all())
    else {
        return;
    };
    for id in held {
        state.queue.cancel(id);
    }
}

fn install(
    state: &mut SimulationState,
    cell: CellId,
    slot: EventSlot,
    time: f64,
    now: f64,
) -> Result<EventId, SimulationError> {
    let id = state.allocate_event_id();
    let event = SimEvent::new(id, EventKind::for_slot(slot, cell), time, now);
    let previous = state
        .tissue
        .cell_mut(cell)
        .ok_or(TissueError::UnknownCell(cell))?
        .pending_mut()
        .replace(slot, id);
    if let Some(previous) = previous {
        state.queue.cancel(previous);
    }
    state.queue.insert(event)?;
    trace!(%cell, ?slot, %id, time, "Event scheduled");
    Ok(id)
}

// ---------------------------------------------------------------------------
// Cell events
// ---------------------------------------------------------------------------

/// Schedule a cell's baseline apoptosis.
///
/// # Errors
///
/// Returns [`SimulationError::Tissue`] if the cell is not alive, or an
/// error from sampling or queueing.
pub fn apoptosis(
    state: &mut SimulationState,
    cell: CellId,
    now: f64,
) -> Result<EventId, SimulationError> {
    let rate = rates::apoptosis_rate(living(state, cell)?, &state.params);
    let floor = state.floors.apoptosis_floor;
    let time = sample_time(state, rate, floor, now)?;
    install(state, cell, EventSlot::Apoptosis, time, now)
}

/// Schedule a cell's feedback apoptosis.
///
/// Feedback only applies while the cell's crypt is above its homeostatic
/// mean and has no dead neighbor. Otherwise any pending feedback event is
/// cancelled and `None` is returned.
///
/// # Errors
///
/// Returns [`SimulationError::Tissue`] if the cell is not alive, or an
/// error from sampling or queueing.
pub fn feedback_apoptosis(
    state: &mut SimulationState,
    cell: CellId,
    now: f64,
) -> Result<Option<EventId>, SimulationError> {
    let subject = living(state, cell)?;
    let crypt = subject.crypt();
    let eligible = !state.tissue.has_dead_neighbor(crypt)?
        && rates::is_above_homeostatic(&state.tissue, crypt, &state.params)?;
    if !eligible {
        if release(state, cell, EventSlot::FeedbackApoptosis).is_some() {
            trace!(%cell, %crypt, "Feedback apoptosis withdrawn");
        }
        return Ok(None);
    }

    let rate = rates::feedback_apoptosis_rate(&state.tissue, subject, &state.params)?;
    let floor = state.floors.apoptosis_floor;
    let time = sample_time(state, rate, floor, now)?;
    install(state, cell, EventSlot::FeedbackApoptosis, time, now).map(Some)
}

/// Schedule a cell's symmetric division.
///
/// # Errors
///
/// Returns [`SimulationError::Tissue`] if the cell is not alive, or an
/// error from sampling or queueing.
pub fn symmetric_division(
    state: &mut SimulationState,
    cell: CellId,
    now: f64,
) -> Result<EventId, SimulationError> {
    let rate = rates::division_rate(&state.tissue, living(state, cell)?, &state.params)?;
    let floor = state.floors.cell_division_floor;
    let time = sample_time(state, rate, floor, now)?;
    let id = install(state, cell, EventSlot::SymmetricDivision, time, now)?;
    correct_division_events(state, cell)?;
    Ok(id)
}

/// Schedule a cell's asymmetric division.
///
/// # Errors
///
/// Returns [`SimulationError::Tissue`] if the cell is not alive, or an
/// error from sampling or queueing.
pub fn asymmetric_division(
    state: &mut SimulationState,
    cell: CellId,
    now: f64,
) -> Result<EventId, SimulationError> {
    let rate = rates::asymmetric_division_rate(living(state, cell)?, &state.params);
    let floor = state.floors.cell_division_floor;
    let time = sample_time(state, rate, floor, now)?;
    let id = install(state, cell, EventSlot::AsymmetricDivision, time, now)?;
    correct_division_events(state, cell)?;
    Ok(id)
}

/// Keep a cell's two divisions at least one division floor apart.
///
/// If the symmetric division falls less than a floor after the asymmetric
/// one, it is pushed back to exactly `asymmetric + floor`. Returns whether
/// a push happened.
///
/// # Errors
///
/// Returns [`SimulationError::Queue`] if the pushed time is NaN.
pub fn correct_division_events(
    state: &mut SimulationState,
    cell: CellId,
) -> Result<bool, SimulationError> {
    let Some(pending) = state.tissue.cell(cell).map(|c| *c.pending()) else {
        return Ok(false);
    };
    let (Some(symmetric), Some(asymmetric)) = (
        pending.get(EventSlot::SymmetricDivision),
        pending.get(EventSlot::AsymmetricDivision),
    ) else {
        return Ok(false);
    };
    let (Some(symmetric_time), Some(asymmetric_time)) = (
        state.queue.time_of(symmetric),
        state.queue.time_of(asymmetric),
    ) else {
        return Ok(false);
    };

    let floor = state.floors.cell_division_floor;
    if symmetric_time > asymmetric_time && symmetric_time - asymmetric_time < floor {
        let pushed = asymmetric_time + floor;
        state.queue.reschedule(symmetric, pushed)?;
        trace!(%cell, from = symmetric_time, to = pushed, "Symmetric division pushed back");
        return Ok(true);
    }
    Ok(false)
}

// ---------------------------------------------------------------------------
// Crypt and run events
// ---------------------------------------------------------------------------

/// Schedule a bifurcation of `crypt` at `now`.
///
/// # Errors
///
/// Returns [`SimulationError::Queue`] if `now` is NaN.
pub fn bifurcation(
    state: &mut SimulationState,
    crypt: CryptId,
    now: f64,
) -> Result<EventId, SimulationError> {
    let id = state.allocate_event_id();
    state
        .queue
        .insert(SimEvent::new(id, EventKind::CryptBifurcation(crypt), now, now))?;
    trace!(%crypt, %id, time = now, "Bifurcation scheduled");
    Ok(id)
}

/// Schedule the end of the run at `now`.
///
/// # Errors
///
/// Returns [`SimulationError::Queue`] if `now` is NaN.
pub fn end(state: &mut SimulationState, now: f64) -> Result<EventId, SimulationError> {
    let id = state.allocate_event_id();
    state.queue.insert(SimEvent::end(id, now))?;
    Ok(id)
}

/// Give every cell its initial events at time zero, in crypt then cell
/// order: apoptosis, feedback apoptosis, symmetric division, asymmetric
/// division.
///
/// # Errors
///
/// Returns any error raised by the individual generators.
pub fn seed_initial_events(state: &mut SimulationState) -> Result<(), SimulationError> {
    for cell in state.tissue.cells_in_grid_order() {
        apoptosis(state, cell, 0.0)?;
        feedback_apoptosis(state, cell, 0.0)?;
        symmetric_division(state, cell, 0.0)?;
        asymmetric_division(state, cell, 0.0)?;
    }
    Ok(())
}
