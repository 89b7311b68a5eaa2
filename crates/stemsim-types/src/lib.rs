//! Shared type definitions for the stem-cell crypt simulation.
//!
//! Every crate in the workspace names cells, crypts, and events through the
//! identifiers defined here, so the kernel and the domain model never mix
//! them up.
//!
//! # Modules
//!
//! - [`ids`] -- Sequential identifiers for cells, crypts, and events, plus run ids
//! - [`enums`] -- Event types, mutation classes, TSG compartments, hex directions

pub mod enums;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use enums::{EventType, HexDirection, MutationClass, TsgLocation};
pub use ids::{CellId, CryptId, EventId, RunId};
