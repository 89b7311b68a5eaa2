//! The simulation driver loop.
//!
//! [`run_simulation`] pops events in time order, executes the valid ones,
//! and reports each to an [`EventObserver`] until one of the termination
//! conditions holds:
//!
//! - **Cancer**: an end event reached the front of the queue
//! - **Extinction**: no crypt has a living cell
//! - **Duration**: an executed event lay beyond the configured duration
//! - **Event budget**: `max_events` events were executed
//! - **Exhaustion**: nothing is left to pop

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::error::SimulationError;
use crate::event::{START_TIME, SimEvent};
use crate::observer::EventObserver;
use crate::state::SimulationState;
use crate::transition;

/// Reason why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// An end event was popped: a crypt or cell became cancerous.
    Cancer,
    /// The tissue has no living cells.
    Extinction,
    /// An executed event lay beyond the configured duration.
    DurationReached,
    /// The configured number of events was executed.
    MaxEventsReached,
    /// The queue ran dry.
    QueueExhausted,
}

/// Result of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// Number of valid events executed, sentinels included.
    pub events_executed: u64,
    /// Time of the most recently executed event.
    pub final_time: f64,
    /// The most recently executed event, with its outcome.
    pub last_event: Option<SimEvent>,
    /// Living cells when the run stopped.
    pub living_cells: usize,
    /// Crypts with at least one living cell when the run stopped.
    pub living_crypts: usize,
}

/// Run the event loop until a termination condition is met.
///
/// The start sentinel is inserted here; the initial cell events must
/// already be queued (see [`SimulationState::from_config`]).
///
/// # Errors
///
/// Returns [`SimulationError`] if an event cannot be executed. The run is
/// abandoned at that point.
pub fn run_simulation(
    state: &mut SimulationState,
    bounds: &RunConfig,
    observer: &mut dyn EventObserver,
) -> Result<SimulationResult, SimulationError> {
    info!(
        duration = bounds.duration,
        max_events = bounds.max_events,
        cells = state.tissue.cell_count(),
        crypts = state.tissue.crypt_count(),
        queued = state.queue.len(),
        "Simulation starting"
    );

    let start = state.allocate_event_id();
    state.queue.insert(SimEvent::start(start))?;

    let mut executed: u64 = 0;
    let mut last_event: Option<SimEvent> = None;

    let (end_reason, terminal) = loop {
        let Some(mut event) = state.queue.pop() else {
            info!(time = state.current_time, "Event queue exhausted");
            break (SimulationEndReason::QueueExhausted, None);
        };

        if !state.tissue.is_alive() {
            info!(time = state.current_time, "No living cells left -- extinction");
            break (SimulationEndReason::Extinction, None);
        }

        if event.is_end() {
            info!(time = event.time, "End event reached");
            break (SimulationEndReason::Cancer, Some(event));
        }

        if event.is_valid() {
            if event.time.is_nan() {
                warn!(id = %event.id, kind = ?event.kind, "Executing an event with a NaN time");
            }
            let outcome = transition::execute(state, &event)?;
            event.outcome = Some(outcome);
            state.current_time = event.time;
            executed = executed.saturating_add(1);
            last_event = Some(event.clone());
        }

        observer.on_event(&event, &state.tissue);

        if bounds.duration > 0.0 && event.time > bounds.duration {
            info!(
                time = event.time,
                duration = bounds.duration,
                "Duration reached"
            );
            break (SimulationEndReason::DurationReached, None);
        }
        if bounds.max_events > 0 && executed >= bounds.max_events {
            info!(executed, max_events = bounds.max_events, "Event limit reached");
            break (SimulationEndReason::MaxEventsReached, None);
        }

        if bounds.debug_echo_every > 0
            && event.is_valid()
            && executed % bounds.debug_echo_every == 0
        {
            debug!(
                executed,
                time = state.current_time,
                cells = state.tissue.cell_count(),
                living_crypts = state.tissue.living_crypts(),
                queued = state.queue.len(),
                "Simulation progress"
            );
        }
    };

    let terminal = match terminal {
        Some(event) => event,
        None => {
            let time = last_event.as_ref().map_or(START_TIME, |event| event.time);
            SimEvent::end(state.allocate_event_id(), time)
        }
    };
    observer.on_event(&terminal, &state.tissue);

    Ok(SimulationResult {
        end_reason,
        events_executed: executed,
        final_time: state.current_time,
        last_event,
        living_cells: state.tissue.cell_count(),
        living_crypts: state.tissue.living_crypts(),
    })
}

/// Log the end of a run.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        events_executed = result.events_executed,
        final_time = result.final_time,
        living_cells = result.living_cells,
        living_crypts = result.living_crypts,
        "Simulation ended"
    );

    if let Some(ref event) = result.last_event {
        info!(
            id = %event.id,
            kind = ?event.kind,
            time = event.time,
            outcome = ?event.outcome,
            "Last executed event"
        );
    } else {
        warn!("Simulation ended with no events executed");
    }
}
