//! Enumeration types shared across the simulation crates.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// The kind of a scheduled simulation event, without its subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Sentinel inserted when a run begins.
    SimulationStart,
    /// Sentinel that terminates the driver loop.
    SimulationEnd,
    /// Baseline programmed death of a stem cell.
    Apoptosis,
    /// Homeostatic death pressure on a stem cell in an overcrowded crypt.
    FeedbackApoptosis,
    /// A stem cell dividing into two stem cells.
    SymmetricDivision,
    /// A stem cell dividing into itself plus a transit-amplifying daughter.
    AsymmetricDivision,
    /// A crypt splitting half its population into a dead neighbor.
    CryptBifurcation,
}

impl EventType {
    /// Every event type, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::SimulationStart,
        Self::SimulationEnd,
        Self::Apoptosis,
        Self::FeedbackApoptosis,
        Self::SymmetricDivision,
        Self::AsymmetricDivision,
        Self::CryptBifurcation,
    ];

    /// Whether this is one of the start/end sentinels.
    pub const fn is_sentinel(self) -> bool {
        matches!(self, Self::SimulationStart | Self::SimulationEnd)
    }
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// A class of fitness mutation a stem cell can acquire.
///
/// Each class affects exactly one of the apoptosis, division, or mutation
/// rates; the effect is a plain multiplier applied to that rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationClass {
    /// Raises the apoptosis rate.
    DeleteriousApoptosis,
    /// Lowers the division rate.
    DeleteriousDivision,
    /// Lowers the apoptosis rate.
    BeneficialApoptosis,
    /// Raises the division rate.
    BeneficialDivision,
    /// Raises the mutation rate.
    Mutator,
}

impl MutationClass {
    /// Every mutation class, in the order used for cumulative draws.
    pub const ALL: [Self; 5] = [
        Self::DeleteriousApoptosis,
        Self::DeleteriousDivision,
        Self::BeneficialApoptosis,
        Self::BeneficialDivision,
        Self::Mutator,
    ];

    /// Whether this class modifies the apoptosis rate.
    pub const fn affects_apoptosis(self) -> bool {
        matches!(self, Self::DeleteriousApoptosis | Self::BeneficialApoptosis)
    }

    /// Whether this class modifies the division rate.
    pub const fn affects_division(self) -> bool {
        matches!(self, Self::DeleteriousDivision | Self::BeneficialDivision)
    }

    /// Whether this class modifies the mutation rate.
    pub const fn affects_mutation(self) -> bool {
        matches!(self, Self::Mutator)
    }
}

// ---------------------------------------------------------------------------
// Tumor-suppressor hits
// ---------------------------------------------------------------------------

/// Compartment in which a tumor-suppressor gene knockout was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TsgLocation {
    /// Both hits landed in the stem cell itself.
    Stem,
    /// A stem hit combined with a hit in the transit-amplifying progeny.
    Tac,
}

// ---------------------------------------------------------------------------
// Hex grid
// ---------------------------------------------------------------------------

/// One of the six neighbor directions on the hex grid.
///
/// The discriminant is the slot index in a crypt's neighbor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HexDirection {
    /// North-east (slot 0).
    NorthEast = 0,
    /// East (slot 1).
    East = 1,
    /// South-east (slot 2).
    SouthEast = 2,
    /// South-west (slot 3).
    SouthWest = 3,
    /// West (slot 4).
    West = 4,
    /// North-west (slot 5).
    NorthWest = 5,
}

impl HexDirection {
    /// All six directions in slot order.
    pub const ALL: [Self; 6] = [
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// The direction pointing back the other way.
    pub const fn opposite(self) -> Self {
        match self {
            Self::NorthEast => Self::SouthWest,
            Self::East => Self::West,
            Self::SouthEast => Self::NorthWest,
            Self::SouthWest => Self::NorthEast,
            Self::West => Self::East,
            Self::NorthWest => Self::SouthEast,
        }
    }

    /// Slot index in a crypt's neighbor table.
    pub const fn slot(self) -> usize {
        self as usize
    }
}
