//! Discrete-event kernel for the stem-cell crypt simulation.
//!
//! This crate owns the event loop that drives a tissue of intestinal
//! crypts: events are sampled from the rate model, queued by time, and
//! executed one at a time, with every population change cascading into a
//! redraw of the affected crypt's events.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `stemsim-config.yaml` into
//!   strongly-typed structs, plus sweep overrides.
//! - [`event`] -- [`SimEvent`], its kinds and execution outcomes.
//! - [`queue`] -- [`EventQueue`], a time-ordered queue with cancellation.
//! - [`random`] -- [`RandomSource`] trait, [`SeededRandom`] and [`StubRandom`].
//! - [`state`] -- [`SimulationState`], everything a run mutates.
//! - [`schedule`] -- Event generators for each event kind.
//! - [`transition`] -- Event execution.
//! - [`cascade`] -- Crypt-wide rescheduling after a population change.
//! - [`observer`] -- [`EventObserver`] trait and [`ObserverSet`].
//! - [`driver`] -- The loop itself: [`run_simulation`].
//! - [`rescale`] -- Re-times an event after its rate changed.
//!
//! [`SimEvent`]: event::SimEvent
//! [`EventQueue`]: queue::EventQueue
//! [`RandomSource`]: random::RandomSource
//! [`SeededRandom`]: random::SeededRandom
//! [`StubRandom`]: random::StubRandom
//! [`SimulationState`]: state::SimulationState
//! [`EventObserver`]: observer::EventObserver
//! [`ObserverSet`]: observer::ObserverSet
//! [`run_simulation`]: driver::run_simulation

pub mod cascade;
pub mod config;
pub mod driver;
pub mod error;
pub mod event;
pub mod observer;
pub mod queue;
pub mod random;
pub mod rescale;
pub mod schedule;
pub mod state;
pub mod transition;

pub use config::{ConfigError, SimulationConfig};
pub use driver::{SimulationEndReason, SimulationResult, log_simulation_end, run_simulation};
pub use error::SimulationError;
pub use event::{EventKind, EventOutcome, SimEvent};
pub use observer::{EventObserver, NoOpObserver, ObserverSet};
pub use state::SimulationState;
