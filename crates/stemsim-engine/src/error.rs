//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and replicate execution.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading, validation, or a sweep override failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: stemsim_core::ConfigError,
    },

    /// A replicate aborted.
    #[error("simulation error: {source}")]
    Simulation {
        /// The underlying simulation error.
        #[from]
        source: stemsim_core::SimulationError,
    },

    /// A run summary could not be serialized.
    #[error("output error: {source}")]
    Output {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
