//! Stem cells and the events they have pending.

use serde::{Deserialize, Serialize};
use stemsim_types::{CellId, CryptId, EventId};

use crate::mutation::{MutationEffect, MutationLoad};

/// Which of a cell's four pending-event slots an event occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventSlot {
    /// Baseline apoptosis.
    Apoptosis,
    /// Homeostatic feedback apoptosis.
    FeedbackApoptosis,
    /// Symmetric division.
    SymmetricDivision,
    /// Asymmetric division.
    AsymmetricDivision,
}

impl EventSlot {
    /// All slots, in the order events are generated for a fresh cell.
    pub const ALL: [Self; 4] = [
        Self::Apoptosis,
        Self::FeedbackApoptosis,
        Self::SymmetricDivision,
        Self::AsymmetricDivision,
    ];
}

/// The at-most-one pending event of each kind owned by a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEvents {
    apoptosis: Option<EventId>,
    feedback_apoptosis: Option<EventId>,
    symmetric_division: Option<EventId>,
    asymmetric_division: Option<EventId>,
}

impl PendingEvents {
    /// The event held in a slot.
    pub const fn get(&self, slot: EventSlot) -> Option<EventId> {
        match slot {
            EventSlot::Apoptosis => self.apoptosis,
            EventSlot::FeedbackApoptosis => self.feedback_apoptosis,
            EventSlot::SymmetricDivision => self.symmetric_division,
            EventSlot::AsymmetricDivision => self.asymmetric_division,
        }
    }

    /// Store an event in a slot, returning whatever it replaced.
    pub fn replace(&mut self, slot: EventSlot, event: EventId) -> Option<EventId> {
        self.slot_mut(slot).replace(event)
    }

    /// Empty a slot, returning what it held.
    pub fn take(&mut self, slot: EventSlot) -> Option<EventId> {
        self.slot_mut(slot).take()
    }

    /// Empty every slot, returning the events that were held.
    pub fn take_all(&mut self) -> Vec<EventId> {
        EventSlot::ALL
            .iter()
            .filter_map(|slot| self.take(*slot))
            .collect()
    }

    const fn slot_mut(&mut self, slot: EventSlot) -> &mut Option<EventId> {
        match slot {
            EventSlot::Apoptosis => &mut self.apoptosis,
            EventSlot::FeedbackApoptosis => &mut self.feedback_apoptosis,
            EventSlot::SymmetricDivision => &mut self.symmetric_division,
            EventSlot::AsymmetricDivision => &mut self.asymmetric_division,
        }
    }
}

/// A stem cell living in one crypt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StemCell {
    id: CellId,
    crypt: CryptId,
    alive: bool,
    mutations: MutationLoad,
    tsg_hits: u32,
    tsg_hits_tac: u32,
    pending: PendingEvents,
}

impl StemCell {
    /// Create a fresh, unmutated cell.
    pub fn new(id: CellId, crypt: CryptId) -> Self {
        Self {
            id,
            crypt,
            alive: true,
            mutations: MutationLoad::default(),
            tsg_hits: 0,
            tsg_hits_tac: 0,
            pending: PendingEvents::default(),
        }
    }

    /// Create the daughter of a symmetric division.
    ///
    /// The daughter inherits the parent's crypt, mutation load, and TSG hit
    /// counts as independent copies. It has its own id and starts with no
    /// pending events.
    pub fn daughter(&self, id: CellId) -> Self {
        Self {
            id,
            crypt: self.crypt,
            alive: true,
            mutations: self.mutations.clone(),
            tsg_hits: self.tsg_hits,
            tsg_hits_tac: self.tsg_hits_tac,
            pending: PendingEvents::default(),
        }
    }

    /// This cell's id.
    pub const fn id(&self) -> CellId {
        self.id
    }

    /// The crypt this cell lives in.
    pub const fn crypt(&self) -> CryptId {
        self.crypt
    }

    /// Move the cell to another crypt.
    pub const fn set_crypt(&mut self, crypt: CryptId) {
        self.crypt = crypt;
    }

    /// Whether the cell is alive.
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Mark the cell dead.
    pub const fn kill(&mut self) {
        self.alive = false;
    }

    /// The cell's mutations.
    pub const fn mutations(&self) -> &MutationLoad {
        &self.mutations
    }

    /// Acquire a new mutation.
    pub fn add_mutation(&mut self, effect: MutationEffect, summarize: bool) {
        self.mutations.add(effect, summarize);
    }

    /// Tumor-suppressor hits in the stem cell itself.
    pub const fn tsg_hits(&self) -> u32 {
        self.tsg_hits
    }

    /// Tumor-suppressor hits recorded in the cell's transit-amplifying progeny.
    pub const fn tsg_hits_tac(&self) -> u32 {
        self.tsg_hits_tac
    }

    /// Record a hit in the stem compartment.
    pub const fn tsg_hit(&mut self) {
        self.tsg_hits = self.tsg_hits.saturating_add(1);
    }

    /// Record a hit in the transit-amplifying compartment.
    pub const fn tsg_hit_tac(&mut self) {
        self.tsg_hits_tac = self.tsg_hits_tac.saturating_add(1);
    }

    /// Whether the stem-compartment hits have reached `threshold`.
    pub const fn is_cancerous(&self, threshold: u32) -> bool {
        self.tsg_hits >= threshold
    }

    /// The cell's pending events.
    pub const fn pending(&self) -> &PendingEvents {
        &self.pending
    }

    /// Mutable access to the cell's pending events.
    pub const fn pending_mut(&mut self) -> &mut PendingEvents {
        &mut self.pending
    }
}

#[cfg(test)]
mod tests {
    use stemsim_types::MutationClass;

    use super::*;

    #[test]
    fn replace_returns_previous_event() {
        let mut pending = PendingEvents::default();
        assert_eq!(pending.replace(EventSlot::Apoptosis, EventId::new(1)), None);
        assert_eq!(
            pending.replace(EventSlot::Apoptosis, EventId::new(2)),
            Some(EventId::new(1))
        );
        assert_eq!(pending.get(EventSlot::Apoptosis), Some(EventId::new(2)));
        assert_eq!(pending.get(EventSlot::SymmetricDivision), None);
    }

    #[test]
    fn take_all_empties_every_slot() {
        let mut pending = PendingEvents::default();
        for (raw, slot) in (0_u64..).zip(EventSlot::ALL) {
            pending.replace(slot, EventId::new(raw));
        }
        assert_eq!(pending.take_all().len(), 4);
        assert_eq!(pending, PendingEvents::default());
    }

    #[test]
    fn daughter_copies_genetics_but_not_identity_or_events() {
        let mut parent = StemCell::new(CellId::new(1), CryptId::new(0));
        parent.add_mutation(
            crate::mutation::MutationEffect::new(MutationClass::BeneficialDivision, 1.5),
            true,
        );
        parent.tsg_hit();
        parent
            .pending_mut()
            .replace(EventSlot::Apoptosis, EventId::new(9));

        let mut daughter = parent.daughter(CellId::new(2));
        assert_eq!(daughter.id(), CellId::new(2));
        assert_eq!(daughter.crypt(), parent.crypt());
        assert_eq!(daughter.tsg_hits(), 1);
        assert_eq!(daughter.pending(), &PendingEvents::default());

        daughter.add_mutation(
            crate::mutation::MutationEffect::new(MutationClass::BeneficialDivision, 1.5),
            true,
        );
        assert_eq!(parent.mutations().count(MutationClass::BeneficialDivision), 1);
        assert_eq!(daughter.mutations().count(MutationClass::BeneficialDivision), 2);
    }

    #[test]
    fn cancer_threshold_counts_stem_hits_only() {
        let mut cell = StemCell::new(CellId::new(1), CryptId::new(0));
        cell.tsg_hit_tac();
        cell.tsg_hit_tac();
        assert!(!cell.is_cancerous(2));
        cell.tsg_hit();
        cell.tsg_hit();
        assert!(cell.is_cancerous(2));
    }
}
