//! The per-replicate summary line written to stdout.

use chrono::{DateTime, Utc};
use serde::Serialize;
use stemsim_core::{SimulationEndReason, SimulationResult};
use stemsim_tissue::TsgKnockout;
use stemsim_types::RunId;

use crate::census::Census;
use crate::stats::RunStats;

/// One replicate's outcome, serialized as a single JSON line.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Unique id of the replicate.
    pub run_id: RunId,
    /// Wall-clock start of the replicate.
    pub started_at: DateTime<Utc>,
    /// Replicate index within its sweep value.
    pub replicate: u32,
    /// Dotted path of the swept parameter, if sweeping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep_parameter: Option<String>,
    /// Value of the swept parameter, if sweeping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep_value: Option<f64>,
    /// Seed of the replicate's random stream.
    pub seed: u64,
    /// Why the run stopped.
    pub end_reason: SimulationEndReason,
    /// Valid events executed.
    pub events_executed: u64,
    /// Time of the last executed event.
    pub final_time: f64,
    /// Living cells at the end.
    pub living_cells: usize,
    /// Living crypts at the end.
    pub living_crypts: usize,
    /// Tallies from the statistics observer.
    pub stats: RunStats,
    /// Population and mutation counts at the end of the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub census: Option<Census>,
    /// First tumor-suppressor knockouts per compartment.
    pub knockouts: Vec<TsgKnockout>,
}

impl RunSummary {
    /// Assemble the summary of a finished replicate.
    pub fn new(
        replicate: &Replicate<'_>,
        started_at: DateTime<Utc>,
        result: &SimulationResult,
        stats: RunStats,
        census: Option<Census>,
        knockouts: Vec<TsgKnockout>,
    ) -> Self {
        Self {
            run_id: RunId::new(),
            started_at,
            replicate: replicate.index,
            sweep_parameter: replicate.sweep_parameter.map(str::to_owned),
            sweep_value: replicate.sweep_value,
            seed: replicate.seed,
            end_reason: result.end_reason,
            events_executed: result.events_executed,
            final_time: result.final_time,
            living_cells: result.living_cells,
            living_crypts: result.living_crypts,
            stats,
            census,
            knockouts,
        }
    }
}

/// Identity of one replicate within a run set.
#[derive(Debug, Clone, Copy)]
pub struct Replicate<'a> {
    /// Index within its sweep value, from zero.
    pub index: u32,
    /// Swept parameter path, if sweeping.
    pub sweep_parameter: Option<&'a str>,
    /// Swept value, if sweeping.
    pub sweep_value: Option<f64>,
    /// Seed of the replicate.
    pub seed: u64,
}
