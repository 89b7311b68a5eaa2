//! Engine binary for the stem-cell crypt simulation.
//!
//! This is the main entry point that loads a configuration, expands its
//! run set into replicates (optionally across a parameter sweep), runs
//! each replicate to completion, and prints one JSON summary line per
//! replicate to stdout.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from the first argument or `stemsim-config.yaml`
//! 3. Validate it, including the sweep parameter
//! 4. For every sweep value, run `runset.runs` replicates
//! 5. Log and print each replicate's summary

mod census;
mod error;
mod stats;
mod summary;
mod sweep;

use std::path::{Path, PathBuf};

use chrono::Utc;
use stemsim_core::{ObserverSet, SimulationConfig, SimulationState, driver};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::census::CensusObserver;
use crate::error::EngineError;
use crate::stats::RunStatsObserver;
use crate::summary::{Replicate, RunSummary};

/// Config file read when no path is given on the command line.
const DEFAULT_CONFIG_PATH: &str = "stemsim-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a replicate fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("stemsim-engine starting");

    // 2. Load configuration.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = load_config(&config_path)?;

    // 3. Validate.
    config.validate()?;
    info!(
        path = %config_path.display(),
        rows = config.tissue.rows,
        cols = config.tissue.cols,
        mean_cells = config.crypt.mean_cells,
        duration = config.simulation.duration,
        seed = config.simulation.seed,
        runs = config.runset.runs,
        sweep = config.runset.sweep.as_ref().map(|s| s.parameter.as_str()),
        "Configuration loaded"
    );

    // 4. Run every replicate.
    let completed = run_set(&config)?;

    info!(replicates = completed, "stemsim-engine shutdown complete");
    Ok(())
}

/// Load the simulation configuration from `path`, falling back to defaults
/// when the file does not exist.
fn load_config(path: &Path) -> Result<SimulationConfig, EngineError> {
    if path.exists() {
        let config = SimulationConfig::from_file(path)?;
        Ok(config)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(SimulationConfig::default())
    }
}

/// Run the whole run set and return the number of replicates completed.
fn run_set(config: &SimulationConfig) -> Result<u64, EngineError> {
    let parameter = config.runset.sweep.as_ref().map(|s| s.parameter.as_str());
    let mut completed: u64 = 0;

    for value in sweep::sweep_values(config.runset.sweep.as_ref()) {
        let swept = match (parameter, value) {
            (Some(parameter), Some(value)) => {
                info!(parameter, value, "Sweep value");
                config.with_override(parameter, value)?
            }
            _ => config.clone(),
        };

        for index in 0..config.runset.runs {
            let replicate = Replicate {
                index,
                sweep_parameter: parameter,
                sweep_value: value,
                seed: swept.simulation.seed.wrapping_add(u64::from(index)),
            };
            let summary = run_replicate(&swept, &replicate)?;
            println!("{}", serde_json::to_string(&summary)?);
            completed = completed.saturating_add(1);
        }
    }
    Ok(completed)
}

/// Build, run, and summarize one replicate.
fn run_replicate(
    config: &SimulationConfig,
    replicate: &Replicate<'_>,
) -> Result<RunSummary, EngineError> {
    let started_at = Utc::now();
    info!(
        replicate = replicate.index,
        seed = replicate.seed,
        sweep_value = replicate.sweep_value,
        "Replicate starting"
    );

    let mut state = SimulationState::from_config(config, replicate.seed)?;
    let mut stats = RunStatsObserver::new();
    let mut census = CensusObserver::new();
    let result = {
        let mut observers = ObserverSet::new();
        observers.register(Box::new(&mut stats));
        observers.register(Box::new(&mut census));
        driver::run_simulation(&mut state, &config.simulation, &mut observers)?
    };
    driver::log_simulation_end(&result);

    Ok(RunSummary::new(
        replicate,
        started_at,
        &result,
        stats.into_stats(),
        census.census(),
        state.tissue.knockouts().to_vec(),
    ))
}
