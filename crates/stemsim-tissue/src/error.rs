//! Error types for the `stemsim-tissue` crate.
//!
//! All fallible operations in this crate return [`TissueError`] through the
//! standard [`Result`] type.

use stemsim_types::{CellId, CryptId};

/// Errors that can occur while mutating the tissue arena.
#[derive(Debug, thiserror::Error)]
pub enum TissueError {
    /// A cell was not found in the tissue.
    #[error("cell not found: {0}")]
    UnknownCell(CellId),

    /// A crypt was not found in the tissue.
    #[error("crypt not found: {0}")]
    UnknownCrypt(CryptId),

    /// A cell claims membership of a crypt whose population does not hold it.
    #[error("cell {cell} is not in crypt {crypt}")]
    CellNotInCrypt {
        /// The cell.
        cell: CellId,
        /// The crypt it claims to belong to.
        crypt: CryptId,
    },

    /// The requested grid dimensions cannot form a tissue.
    #[error("invalid tissue layout: {reason}")]
    InvalidLayout {
        /// Why the layout was rejected.
        reason: String,
    },
}
