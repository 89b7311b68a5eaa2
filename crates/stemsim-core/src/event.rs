//! Scheduled simulation events.
//!
//! A [`SimEvent`] is created by one of the generators in
//! [`schedule`](crate::schedule), lives in the
//! [`EventQueue`](crate::queue::EventQueue) until it is either cancelled or
//! popped, and is then executed once by the driver. Its identity ([`EventId`])
//! never changes; its time only changes through an explicit
//! remove-then-reinsert.

use serde::{Deserialize, Serialize};
use stemsim_tissue::EventSlot;
use stemsim_types::{CellId, CryptId, EventId, EventType};

/// Time at which the start sentinel is scheduled, ahead of every initial event.
pub const START_TIME: f64 = -1.0;

/// What an event does, and to whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Start sentinel. No domain effect.
    SimulationStart,
    /// End sentinel. Terminates the driver loop when popped.
    SimulationEnd,
    /// Baseline apoptosis of a cell.
    Apoptosis(CellId),
    /// Homeostatic feedback apoptosis of a cell.
    FeedbackApoptosis(CellId),
    /// Symmetric division of a cell.
    SymmetricDivision(CellId),
    /// Asymmetric division of a cell.
    AsymmetricDivision(CellId),
    /// Bifurcation of a crypt into a dead neighbor.
    CryptBifurcation(CryptId),
}

impl EventKind {
    /// The event for a cell's pending-event slot.
    pub const fn for_slot(slot: EventSlot, cell: CellId) -> Self {
        match slot {
            EventSlot::Apoptosis => Self::Apoptosis(cell),
            EventSlot::FeedbackApoptosis => Self::FeedbackApoptosis(cell),
            EventSlot::SymmetricDivision => Self::SymmetricDivision(cell),
            EventSlot::AsymmetricDivision => Self::AsymmetricDivision(cell),
        }
    }

    /// The kind without its subject.
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::SimulationStart => EventType::SimulationStart,
            Self::SimulationEnd => EventType::SimulationEnd,
            Self::Apoptosis(_) => EventType::Apoptosis,
            Self::FeedbackApoptosis(_) => EventType::FeedbackApoptosis,
            Self::SymmetricDivision(_) => EventType::SymmetricDivision,
            Self::AsymmetricDivision(_) => EventType::AsymmetricDivision,
            Self::CryptBifurcation(_) => EventType::CryptBifurcation,
        }
    }

    /// The cell this event acts on, if any.
    pub const fn cell(&self) -> Option<CellId> {
        match self {
            Self::Apoptosis(cell)
            | Self::FeedbackApoptosis(cell)
            | Self::SymmetricDivision(cell)
            | Self::AsymmetricDivision(cell) => Some(*cell),
            Self::SimulationStart | Self::SimulationEnd | Self::CryptBifurcation(_) => None,
        }
    }

    /// The crypt this event acts on, if it is a crypt event.
    pub const fn crypt(&self) -> Option<CryptId> {
        match self {
            Self::CryptBifurcation(crypt) => Some(*crypt),
            _ => None,
        }
    }

    /// The pending-event slot a cell event occupies.
    pub const fn slot(&self) -> Option<EventSlot> {
        match self {
            Self::Apoptosis(_) => Some(EventSlot::Apoptosis),
            Self::FeedbackApoptosis(_) => Some(EventSlot::FeedbackApoptosis),
            Self::SymmetricDivision(_) => Some(EventSlot::SymmetricDivision),
            Self::AsymmetricDivision(_) => Some(EventSlot::AsymmetricDivision),
            Self::SimulationStart | Self::SimulationEnd | Self::CryptBifurcation(_) => None,
        }
    }
}

/// What executing an event did to the tissue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventOutcome {
    /// The subject was already dead or otherwise ineligible.
    Skipped,
    /// A sentinel ran.
    Sentinel,
    /// A cell died and left its crypt.
    CellDied {
        /// The dead cell.
        cell: CellId,
        /// The crypt it left.
        crypt: CryptId,
    },
    /// A cell divided symmetrically.
    CellDivided {
        /// The dividing cell.
        parent: CellId,
        /// The new cell.
        daughter: CellId,
        /// The crypt both live in.
        crypt: CryptId,
    },
    /// A cell divided asymmetrically and stays the only stem cell of the pair.
    CellRenewed {
        /// The dividing cell.
        cell: CellId,
    },
    /// A crypt moved half its population into a dead neighbor.
    CryptBifurcated {
        /// The splitting crypt.
        source: CryptId,
        /// The dead neighbor that was repopulated.
        daughter: CryptId,
        /// Number of cells moved.
        moved: usize,
    },
}

/// A schedulable unit of simulation work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    /// Stable identity.
    pub id: EventId,
    /// What the event does.
    pub kind: EventKind,
    /// Absolute simulation time at which the event fires.
    pub time: f64,
    /// Simulation time at which the event was generated.
    pub clocked: f64,
    /// Fraction of the wait already elapsed at `clocked`. Only the
    /// rescale utility reads or writes this.
    pub percent_complete: f64,
    /// Result of execution, filled in by the driver.
    pub outcome: Option<EventOutcome>,
    valid: bool,
}

impl SimEvent {
    /// Create a valid event generated at `clocked` to fire at `time`.
    pub const fn new(id: EventId, kind: EventKind, time: f64, clocked: f64) -> Self {
        Self {
            id,
            kind,
            time,
            clocked,
            percent_complete: 0.0,
            outcome: None,
            valid: true,
        }
    }

    /// The start sentinel.
    pub const fn start(id: EventId) -> Self {
        Self::new(id, EventKind::SimulationStart, START_TIME, START_TIME)
    }

    /// An end sentinel at `time`.
    pub const fn end(id: EventId, time: f64) -> Self {
        Self::new(id, EventKind::SimulationEnd, time, time)
    }

    /// Whether the event may still be executed.
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Mark the event as cancelled. Cancelled events are never executed.
    pub const fn invalidate(&mut self) {
        self.valid = false;
    }

    /// The kind without its subject.
    pub const fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    /// Whether this is an end sentinel.
    pub const fn is_end(&self) -> bool {
        matches!(self.kind, EventKind::SimulationEnd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_round_trip() {
        let cell = CellId::new(3);
        for slot in EventSlot::ALL {
            let kind = EventKind::for_slot(slot, cell);
            assert_eq!(kind.slot(), Some(slot));
            assert_eq!(kind.cell(), Some(cell));
        }
        assert_eq!(EventKind::CryptBifurcation(CryptId::new(1)).slot(), None);
    }

    #[test]
    fn sentinels() {
        let start = SimEvent::start(EventId::new(0));
        assert!(start.time < 0.0);
        assert!(start.event_type().is_sentinel());
        let end = SimEvent::end(EventId::new(1), 5.0);
        assert!(end.is_end());
        assert!(!start.is_end());
    }

    #[test]
    fn invalidation_is_terminal() {
        let mut event = SimEvent::new(
            EventId::new(0),
            EventKind::Apoptosis(CellId::new(0)),
            1.0,
            0.0,
        );
        assert!(event.is_valid());
        event.invalidate();
        assert!(!event.is_valid());
    }
}
