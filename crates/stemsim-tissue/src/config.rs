//! Biological parameters for stem cells, crypts, mutations, and cancer.
//!
//! These values correspond to the `tissue`, `crypt`, `stem_cell`,
//! `mutation`, and `cancer` sections of `stemsim-config.yaml`. The
//! [`TissueParams`] struct bundles every tunable the rate model reads so
//! that callers (the kernel, tests) can override defaults.

use serde::{Deserialize, Serialize};
use stemsim_types::MutationClass;

/// All biological parameters for one run, resolved once at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TissueParams {
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

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Hex grid dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutParams {
    /// Number of crypt rows.
    #[serde(default = "default_rows")]
    pub rows: u32,

    /// Number of crypts per row.
    #[serde(default = "default_cols")]
    pub cols: u32,

    /// Whether the east and west edges of the grid are joined.
    #[serde(default = "default_true")]
    pub wraparound: bool,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            cols: default_cols(),
            wraparound: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Crypt
// ---------------------------------------------------------------------------

/// Crypt homeostasis and bifurcation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptParams {
    /// Homeostatic mean stem-cell population (also the seeded population).
    #[serde(default = "default_mean_cells")]
    pub mean_cells: u32,

    /// Population step size used to measure distance from the mean.
    #[serde(default = "default_standard_deviation")]
    pub standard_deviation: u32,

    /// Feedback apoptosis multiplier per step above the mean.
    #[serde(default = "default_apoptosis_multiplier")]
    pub apoptosis_multiplier: f64,

    /// Division multiplier per step below the mean.
    #[serde(default = "default_division_multiplier")]
    pub division_multiplier: f64,

    /// Division multiplier applied while any neighbor crypt is dead.
    #[serde(default = "default_dead_neighbor_division_multiplier")]
    pub dead_neighbor_division_multiplier: f64,

    /// Population, as a multiple of the mean, at which a crypt may bifurcate.
    #[serde(default = "default_bifurcation_threshold_ratio")]
    pub bifurcation_threshold_ratio: f64,
}

impl Default for CryptParams {
    fn default() -> Self {
        Self {
            mean_cells: default_mean_cells(),
            standard_deviation: default_standard_deviation(),
            apoptosis_multiplier: default_apoptosis_multiplier(),
            division_multiplier: default_division_multiplier(),
            dead_neighbor_division_multiplier: default_dead_neighbor_division_multiplier(),
            bifurcation_threshold_ratio: default_bifurcation_threshold_ratio(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stem cell
// ---------------------------------------------------------------------------

/// Per-cell base rates, in events per unit of simulated time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StemCellParams {
    /// Base apoptosis rate.
    #[serde(default = "default_apoptosis_rate")]
    pub apoptosis_rate: f64,

    /// Base symmetric division rate.
    #[serde(default = "default_division_rate")]
    pub division_rate: f64,

    /// Probability that a division introduces a fitness mutation.
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,

    /// Cap on the fitness mutation probability after mutator effects.
    #[serde(default = "default_mutation_rate_max")]
    pub mutation_rate_max: f64,

    /// Per-division probability of a tumor-suppressor gene hit.
    #[serde(default = "default_tsg_mutation_rate")]
    pub tsg_mutation_rate: f64,

    /// Cap on the TSG hit probability after mutator effects.
    #[serde(default = "default_tsg_mutation_rate_max")]
    pub tsg_mutation_rate_max: f64,

    /// Size of the transit-amplifying compartment fed by one crypt.
    #[serde(default = "default_tac_size")]
    pub tac_size: u32,

    /// Asymmetric divisions per symmetric division.
    #[serde(default = "default_asymmetric_division_ratio")]
    pub asymmetric_division_ratio: u32,
}

impl Default for StemCellParams {
    fn default() -> Self {
        Self {
            apoptosis_rate: default_apoptosis_rate(),
            division_rate: default_division_rate(),
            mutation_rate: default_mutation_rate(),
            mutation_rate_max: default_mutation_rate_max(),
            tsg_mutation_rate: default_tsg_mutation_rate(),
            tsg_mutation_rate_max: default_tsg_mutation_rate_max(),
            tac_size: default_tac_size(),
            asymmetric_division_ratio: default_asymmetric_division_ratio(),
        }
    }
}

// ---------------------------------------------------------------------------
// Mutation
// ---------------------------------------------------------------------------

/// Probability and effect of one mutation class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationClassParams {
    /// Probability that a mutation, once it occurs, is of this class.
    pub probability: f64,

    /// Multiplier the mutation applies to its affected rate.
    pub multiplier: f64,
}

/// Mutation class probabilities and effect multipliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationParams {
    /// Fold new mutations into per-class summaries instead of storing
    /// each one individually.
    #[serde(default = "default_true")]
    pub summarize: bool,

    /// Mutations that raise apoptosis.
    #[serde(default = "default_deleterious_apoptosis")]
    pub deleterious_apoptosis: MutationClassParams,

    /// Mutations that lower division.
    #[serde(default = "default_deleterious_division")]
    pub deleterious_division: MutationClassParams,

    /// Mutations that lower apoptosis.
    #[serde(default = "default_beneficial_apoptosis")]
    pub beneficial_apoptosis: MutationClassParams,

    /// Mutations that raise division.
    #[serde(default = "default_beneficial_division")]
    pub beneficial_division: MutationClassParams,

    /// Mutations that raise the mutation rate.
    #[serde(default = "default_mutator")]
    pub mutator: MutationClassParams,
}

impl MutationParams {
    /// Parameters of a single class.
    pub const fn class(&self, class: MutationClass) -> MutationClassParams {
        match class {
            MutationClass::DeleteriousApoptosis => self.deleterious_apoptosis,
            MutationClass::DeleteriousDivision => self.deleterious_division,
            MutationClass::BeneficialApoptosis => self.beneficial_apoptosis,
            MutationClass::BeneficialDivision => self.beneficial_division,
            MutationClass::Mutator => self.mutator,
        }
    }
}

impl Default for MutationParams {
    fn default() -> Self {
        Self {
            summarize: true,
            deleterious_apoptosis: default_deleterious_apoptosis(),
            deleterious_division: default_deleterious_division(),
            beneficial_apoptosis: default_beneficial_apoptosis(),
            beneficial_division: default_beneficial_division(),
            mutator: default_mutator(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cancer
// ---------------------------------------------------------------------------

/// Thresholds that mark a crypt or cell cancerous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancerParams {
    /// Population, as a multiple of the mean, above which a crypt is cancerous.
    #[serde(default = "default_uncontrolled_growth_threshold")]
    pub uncontrolled_growth_threshold: f64,

    /// Stem-compartment TSG hits that make a cell cancerous.
    #[serde(default = "default_tsg_threshold")]
    pub tsg_threshold: u32,
}

impl Default for CancerParams {
    fn default() -> Self {
        Self {
            uncontrolled_growth_threshold: default_uncontrolled_growth_threshold(),
            tsg_threshold: default_tsg_threshold(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_true() -> bool {
    true
}

const fn default_rows() -> u32 {
    4
}

const fn default_cols() -> u32 {
    4
}

const fn default_mean_cells() -> u32 {
    10
}

const fn default_standard_deviation() -> u32 {
    2
}

const fn default_apoptosis_multiplier() -> f64 {
    2.0
}

const fn default_division_multiplier() -> f64 {
    2.0
}

const fn default_dead_neighbor_division_multiplier() -> f64 {
    2.0
}

const fn default_bifurcation_threshold_ratio() -> f64 {
    2.0
}

const fn default_apoptosis_rate() -> f64 {
    0.01
}

const fn default_division_rate() -> f64 {
    0.01
}

const fn default_mutation_rate() -> f64 {
    0.01
}

const fn default_mutation_rate_max() -> f64 {
    0.5
}

const fn default_tsg_mutation_rate() -> f64 {
    0.000_01
}

const fn default_tsg_mutation_rate_max() -> f64 {
    0.1
}

const fn default_tac_size() -> u32 {
    1000
}

const fn default_asymmetric_division_ratio() -> u32 {
    10
}

const fn default_deleterious_apoptosis() -> MutationClassParams {
    MutationClassParams {
        probability: 0.2,
        multiplier: 1.1,
    }
}

const fn default_deleterious_division() -> MutationClassParams {
    MutationClassParams {
        probability: 0.2,
        multiplier: 0.9,
    }
}

const fn default_beneficial_apoptosis() -> MutationClassParams {
    MutationClassParams {
        probability: 0.05,
        multiplier: 0.9,
    }
}

const fn default_beneficial_division() -> MutationClassParams {
    MutationClassParams {
        probability: 0.05,
        multiplier: 1.1,
    }
}

const fn default_mutator() -> MutationClassParams {
    MutationClassParams {
        probability: 0.01,
        multiplier: 2.0,
    }
}

const fn default_uncontrolled_growth_threshold() -> f64 {
    4.0
}

const fn default_tsg_threshold() -> u32 {
    2
}
