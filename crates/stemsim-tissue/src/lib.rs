//! Stem cells, crypts, and the hex-grid tissue for the crypt simulation.
//!
//! This crate models the biological state the event kernel drives: cells
//! carrying mutations and tumor-suppressor hits, crypts holding cell
//! populations, and the tissue arena tying them together. It also hosts
//! the rate model, the pure functions that turn that state into event
//! rates.
//!
//! # Modules
//!
//! - [`cell`] -- [`StemCell`] and its pending-event slots.
//! - [`config`] -- Biological parameters with YAML-friendly defaults.
//! - [`crypt`] -- [`Crypt`] population sets and hex neighbor tables.
//! - [`error`] -- Error types for tissue operations.
//! - [`mutation`] -- Shared mutation effects, per-class summaries, and the
//!   catalog used to draw new mutations.
//! - [`rates`] -- Instantaneous division, apoptosis, and mutation rates.
//! - [`tissue`] -- The grid, the cell arena, and TSG knockout records.

pub mod cell;
pub mod config;
pub mod crypt;
pub mod error;
pub mod mutation;
pub mod rates;
pub mod tissue;

// Re-export primary types at crate root.
pub use cell::{EventSlot, PendingEvents, StemCell};
pub use config::{
    CancerParams, CryptParams, LayoutParams, MutationClassParams, MutationParams, StemCellParams,
    TissueParams,
};
pub use crypt::Crypt;
pub use error::TissueError;
pub use mutation::{MutationCatalog, MutationEffect, MutationLoad, MutationSummary};
pub use tissue::{Tissue, TsgKnockout};
