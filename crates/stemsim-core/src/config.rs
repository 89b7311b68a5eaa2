//! Configuration loading and typed config structures for a stemsim run.
//!
//! The canonical configuration lives in `stemsim-config.yaml` at the project
//! root. [`SimulationConfig`] mirrors that file section by section; every
//! key has a default, so a partial (or empty) file is valid.
//!
//! Parameter sweeps address keys by dotted path (`crypt.mean_cells`,
//! `stem_cell.division_rate`) and apply them with
//! [`SimulationConfig::with_override`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yml::{Number, Value};
use stemsim_tissue::{
    CancerParams, CryptParams, LayoutParams, MutationParams, StemCellParams, TissueParams,
};
use stemsim_types::MutationClass;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an impossible run.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },

    /// An override named a key that does not exist or is not numeric.
    #[error("unknown numeric parameter: {path}")]
    UnknownParameter {
        /// The dotted path that was requested.
        path: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `stemsim-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Run bounds, seed, and debug echo.
    #[serde(default)]
    pub simulation: RunConfig,

    /// Replicates and the optional parameter sweep.
    #[serde(default)]
    pub runset: RunSetConfig,

    /// Minimum waits added to sampled event times.
    #[serde(default)]
    pub events: EventFloors,

    /// Hex grid dimensions.
    #[serde(default)]
    pub tissue: LayoutParams,

    /// Crypt homeostasis and bifurcation parameters.
    #[serde(default)]
    pub crypt: CryptParams,

    /// Per-cell base rates.
    #[serde(default)]
    pub stem_cell: StemCellParams,

    /// Mutation class probabilities and effect multipliers.
    #[serde(default)]
    pub mutation: MutationParams,

    /// Thresholds that end the simulation.
    #[serde(default)]
    pub cancer: CancerParams,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// The biological parameters handed to the tissue and the rate model.
    pub fn tissue_params(&self) -> TissueParams {
        TissueParams {
            tissue: self.tissue.clone(),
            crypt: self.crypt.clone(),
            stem_cell: self.stem_cell.clone(),
            mutation: self.mutation.clone(),
            cancer: self.cancer.clone(),
        }
    }

    /// Check that the configuration describes a runnable simulation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first problem found, or
    /// [`ConfigError::UnknownParameter`] if the sweep names a key that does
    /// not exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tissue.rows == 0 || self.tissue.cols == 0 {
            return Err(invalid(format!(
                "tissue must have at least one row and column, got {}x{}",
                self.tissue.rows, self.tissue.cols
            )));
        }
        if self.crypt.mean_cells == 0 {
            return Err(invalid("crypt.mean_cells must be positive"));
        }
        if self.crypt.standard_deviation == 0 {
            return Err(invalid("crypt.standard_deviation must be positive"));
        }

        let non_negative = [
            ("simulation.duration", self.simulation.duration),
            ("events.apoptosis_floor", self.events.apoptosis_floor),
            ("events.cell_division_floor", self.events.cell_division_floor),
            ("crypt.apoptosis_multiplier", self.crypt.apoptosis_multiplier),
            ("crypt.division_multiplier", self.crypt.division_multiplier),
            (
                "crypt.dead_neighbor_division_multiplier",
                self.crypt.dead_neighbor_division_multiplier,
            ),
            (
                "crypt.bifurcation_threshold_ratio",
                self.crypt.bifurcation_threshold_ratio,
            ),
            ("stem_cell.apoptosis_rate", self.stem_cell.apoptosis_rate),
            ("stem_cell.division_rate", self.stem_cell.division_rate),
            ("stem_cell.mutation_rate", self.stem_cell.mutation_rate),
            ("stem_cell.mutation_rate_max", self.stem_cell.mutation_rate_max),
            ("stem_cell.tsg_mutation_rate", self.stem_cell.tsg_mutation_rate),
            (
                "stem_cell.tsg_mutation_rate_max",
                self.stem_cell.tsg_mutation_rate_max,
            ),
            (
                "cancer.uncontrolled_growth_threshold",
                self.cancer.uncontrolled_growth_threshold,
            ),
        ];
        for (key, value) in non_negative {
            if value.is_nan() || value < 0.0 {
                return Err(invalid(format!("{key} must be non-negative, got {value}")));
            }
        }

        let mut total_probability = 0.0;
        for class in MutationClass::ALL {
            let class_params = self.mutation.class(class);
            if !(0.0..=1.0).contains(&class_params.probability) {
                return Err(invalid(format!(
                    "mutation probability for {class:?} must be within [0, 1], got {}",
                    class_params.probability
                )));
            }
            if class_params.multiplier.is_nan() || class_params.multiplier < 0.0 {
                return Err(invalid(format!(
                    "mutation multiplier for {class:?} must be non-negative, got {}",
                    class_params.multiplier
                )));
            }
            total_probability += class_params.probability;
        }
        if total_probability > 1.0 + f64::EPSILON {
            return Err(invalid(format!(
                "mutation class probabilities sum to {total_probability}, above 1"
            )));
        }

        if self.runset.runs == 0 {
            return Err(invalid("runset.runs must be at least 1"));
        }
        if let Some(sweep) = &self.runset.sweep {
            sweep.validate()?;
            self.with_override(&sweep.parameter, sweep.min)?;
        }
        Ok(())
    }

    /// Return a copy of this configuration with one numeric key replaced.
    ///
    /// `path` is the dotted YAML path of the key. Integer keys only accept
    /// whole values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownParameter`] if the path does not lead to
    /// a number, [`ConfigError::Invalid`] if an integer key is given a
    /// fractional or non-finite value, or [`ConfigError::Yaml`] if the
    /// result no longer deserializes.
    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    pub fn with_override(&self, path: &str, value: f64) -> Result<Self, ConfigError> {
        let unknown = || ConfigError::UnknownParameter {
            path: path.to_owned(),
        };

        let mut root = serde_yml::to_value(self)?;
        let mut node = &mut root;
        for key in path.split('.') {
            node = node.get_mut(key).ok_or_else(unknown)?;
        }

        let replacement = match node {
            Value::Number(number) if number.is_f64() => Number::from(value),
            Value::Number(_) => {
                if !value.is_finite() || value.trunc() != value {
                    return Err(invalid(format!("{path} takes whole numbers, got {value}")));
                }
                Number::from(value as i64)
            }
            _ => return Err(unknown()),
        };
        *node = Value::Number(replacement);

        let config: Self = serde_yml::from_value(root)?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Bounds and reproducibility settings for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Simulated time after which the run stops. `0` means unbounded.
    #[serde(default = "default_duration")]
    pub duration: f64,

    /// Executed events after which the run stops. `0` means unbounded.
    #[serde(default)]
    pub max_events: u64,

    /// Seed of the first replicate; replicate `n` uses `seed + n`.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Emit a debug state summary every this many events. `0` disables it.
    #[serde(default)]
    pub debug_echo_every: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration: default_duration(),
            max_events: 0,
            seed: default_seed(),
            debug_echo_every: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Run set
// ---------------------------------------------------------------------------

/// Replicates and sweep for one invocation of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSetConfig {
    /// Replicates per parameter value.
    #[serde(default = "default_runs")]
    pub runs: u32,

    /// Optional sweep of one numeric parameter.
    #[serde(default)]
    pub sweep: Option<SweepConfig>,
}

impl Default for RunSetConfig {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            sweep: None,
        }
    }
}

/// A sweep of one numeric parameter from `min` to `max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Dotted path of the swept key, for example `crypt.mean_cells`.
    pub parameter: String,

    /// First value.
    pub min: f64,

    /// Last value, always included.
    pub max: f64,

    /// Increment between values.
    pub step: f64,
}

impl SweepConfig {
    /// Check the sweep bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `step` is not positive or the
    /// bounds are reversed or not finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step.is_nan() || self.step <= 0.0 {
            return Err(invalid(format!(
                "runset.sweep.step must be positive, got {}",
                self.step
            )));
        }
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(invalid(format!(
                "runset.sweep bounds must satisfy min <= max, got {}..{}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Minimum waits added to every sampled event time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventFloors {
    /// Added to baseline and feedback apoptosis waits.
    #[serde(default)]
    pub apoptosis_floor: f64,

    /// Added to symmetric and asymmetric division waits. Also the window
    /// within which a pending division counts as impending.
    #[serde(default = "default_cell_division_floor")]
    pub cell_division_floor: f64,
}

impl Default for EventFloors {
    fn default() -> Self {
        Self {
            apoptosis_floor: 0.0,
            cell_division_floor: default_cell_division_floor(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_duration() -> f64 {
    1000.0
}

const fn default_seed() -> u64 {
    42
}

const fn default_runs() -> u32 {
    1
}

const fn default_cell_division_floor() -> f64 {
    1.0
}
