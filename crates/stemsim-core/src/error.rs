//! Errors that abort a simulation run.

use stemsim_tissue::TissueError;
use stemsim_types::{CellId, EventId};

use crate::queue::QueueError;
use crate::random::RandomError;

/// Errors raised while building or running a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The event queue rejected an event.
    #[error("queue error: {source}")]
    Queue {
        /// The underlying queue error.
        #[from]
        source: QueueError,
    },

    /// A tissue lookup or update failed.
    #[error("tissue error: {source}")]
    Tissue {
        /// The underlying tissue error.
        #[from]
        source: TissueError,
    },

    /// A wait time could not be sampled.
    #[error("random error: {source}")]
    Random {
        /// The underlying sampling error.
        #[from]
        source: RandomError,
    },

    /// A cell was asked to divide after its own death was already due.
    #[error("cell {cell} divides at {division_time} but is due to die at {death_time}")]
    DoomedDivision {
        /// The dividing cell.
        cell: CellId,
        /// The division event being executed.
        event: EventId,
        /// Time of the division.
        division_time: f64,
        /// Time of the earliest pending death.
        death_time: f64,
    },

    /// Internal bookkeeping disagreed with itself.
    #[error("invariant violated: {reason}")]
    InvariantViolation {
        /// What was inconsistent.
        reason: String,
    },
}
