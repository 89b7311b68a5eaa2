//! Time-ordered event queue with removal by handle.
//!
//! Events are kept in a `BTreeMap` keyed by `(time, sequence)`, with a
//! second map from [`EventId`] to key so that any queued event can be
//! cancelled in O(log n).
//!
//! # Ordering
//!
//! Events pop in ascending `time` (compared with [`f64::total_cmp`]). Two
//! events with exactly equal times are never considered equal: the one
//! inserted first pops first. Every insertion, including a reschedule,
//! takes a fresh sequence number.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use stemsim_types::EventId;
use tracing::trace;

use crate::event::SimEvent;

/// Errors raised by the event queue.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// An event was offered with a NaN time.
    #[error("event {id} has a NaN time and cannot be queued")]
    NotANumber {
        /// The rejected event.
        id: EventId,
    },
}

#[derive(Debug, Clone, Copy)]
struct QueueKey {
    time: f64,
    seq: u64,
}

impl PartialEq for QueueKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueKey {}

impl PartialOrd for QueueKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Priority queue of pending simulation events.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    entries: BTreeMap<QueueKey, SimEvent>,
    index: BTreeMap<EventId, QueueKey>,
    next_seq: u64,
}

impl EventQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            index: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Queue an event. An event already queued under the same id is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NotANumber`] if the event's time is NaN.
    pub fn insert(&mut self, event: SimEvent) -> Result<(), QueueError> {
        if event.time.is_nan() {
            return Err(QueueError::NotANumber { id: event.id });
        }
        self.remove(event.id);

        let key = QueueKey {
            time: event.time,
            seq: self.next_seq,
        };
        self.next_seq = self.next_seq.wrapping_add(1);
        trace!(id = %event.id, time = event.time, kind = ?event.kind, "Event queued");
        self.index.insert(event.id, key);
        self.entries.insert(key, event);
        Ok(())
    }

    /// The earliest event, without removing it.
    pub fn peek(&self) -> Option<&SimEvent> {
        self.entries.first_key_value().map(|(_, event)| event)
    }

    /// Remove and return the earliest event.
    pub fn pop(&mut self) -> Option<SimEvent> {
        let (_, event) = self.entries.pop_first()?;
        self.index.remove(&event.id);
        Some(event)
    }

    /// Remove an event by id.
    ///
    /// Returns `false`, leaving the queue untouched, if the event is not
    /// queued (never inserted, already popped, or already removed).
    pub fn remove(&mut self, id: EventId) -> bool {
        self.take(id).is_some()
    }

    /// Invalidate and remove an event, returning it if it was queued.
    pub fn cancel(&mut self, id: EventId) -> Option<SimEvent> {
        let mut event = self.take(id)?;
        event.invalidate();
        trace!(%id, "Event cancelled");
        Some(event)
    }

    fn take(&mut self, id: EventId) -> Option<SimEvent> {
        let key = self.index.remove(&id)?;
        self.entries.remove(&key)
    }

    /// Move a queued event to a new time.
    ///
    /// Returns `Ok(false)` if the event is not queued.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NotANumber`] if `time` is NaN; the event stays
    /// at its old time.
    pub fn reschedule(&mut self, id: EventId, time: f64) -> Result<bool, QueueError> {
        if time.is_nan() {
            return Err(QueueError::NotANumber { id });
        }
        let Some(mut event) = self.take(id) else {
            return Ok(false);
        };
        event.time = time;
        self.insert(event)?;
        Ok(true)
    }

    /// Look up a queued event.
    pub fn get(&self, id: EventId) -> Option<&SimEvent> {
        self.index.get(&id).and_then(|key| self.entries.get(key))
    }

    /// The scheduled time of a queued event.
    pub fn time_of(&self, id: EventId) -> Option<f64> {
        self.get(id).map(|event| event.time)
    }

    /// Whether an event is queued.
    pub fn contains(&self, id: EventId) -> bool {
        self.index.contains_key(&id)
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queued events in pop order.
    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.entries.values()
    }
}
