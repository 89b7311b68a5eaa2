//! Type-safe identifier wrappers.
//!
//! Simulation entities (cells, crypts, scheduled events) carry sequential
//! `u64` identifiers so that a seeded run allocates exactly the same ids
//! every time. Runs themselves are labelled with a UUID v7 ([`RunId`]),
//! which only appears in run summaries and never influences scheduling.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around a sequential `u64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            /// Wrap a raw sequence number.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Return the inner sequence number.
            pub const fn into_inner(self) -> u64 {
                self.0
            }

            /// Return the identifier that follows this one.
            pub const fn next(self) -> Self {
                Self(self.0.saturating_add(1))
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a stem cell.
    CellId
}

define_id! {
    /// Unique identifier for a crypt (row-major index into the tissue grid).
    CryptId
}

define_id! {
    /// Unique identifier for a scheduled simulation event.
    EventId
}

/// Unique identifier for one simulation run (replicate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new run identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RunId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_by_sequence() {
        let first = CellId::new(1);
        let second = first.next();
        assert!(first < second);
        assert_eq!(second.into_inner(), 2);
    }

    #[test]
    fn next_saturates() {
        assert_eq!(EventId::new(u64::MAX).next(), EventId::new(u64::MAX));
    }

    #[test]
    fn id_display() {
        assert_eq!(CryptId::new(7).to_string(), "7");
    }

    #[test]
    fn id_serialization_is_transparent_number() {
        let id = CellId::new(42);
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "42");
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }
}
