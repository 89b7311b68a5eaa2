//! The rate model: instantaneous per-cell rates and crypt feedback effects.
//!
//! Every function here is pure. It reads parameters and tissue state and
//! returns a number; nothing is scheduled or mutated.
//!
//! Effects compose multiplicatively, and the order of composition differs
//! per rate:
//!
//! | Rate | Composition |
//! |---|---|
//! | apoptosis | base, individual effects, deleterious-apoptosis, beneficial-apoptosis |
//! | feedback apoptosis | base, crypt apoptosis effect |
//! | symmetric division | base, crypt division effect, individual effects, beneficial-division, deleterious-division |
//! | asymmetric division | base, individual effects, beneficial-division, deleterious-division, ratio |
//! | mutation / TSG | base, crypt mutation effect, individual effects, mutator, cap |

use stemsim_types::{CryptId, MutationClass};

use crate::cell::StemCell;
use crate::config::{CryptParams, TissueParams};
use crate::error::TissueError;
use crate::tissue::Tissue;

// ---------------------------------------------------------------------------
// Crypt effects
// ---------------------------------------------------------------------------

/// Whole standard deviations between a population and the homeostatic mean,
/// truncated toward zero.
pub fn distance_from_mean(population: usize, params: &CryptParams) -> i64 {
    let population = i64::try_from(population).unwrap_or(i64::MAX);
    population
        .saturating_sub(i64::from(params.mean_cells))
        .checked_div(i64::from(params.standard_deviation))
        .unwrap_or(0)
}

fn pow_steps(multiplier: f64, steps: i64) -> f64 {
    multiplier.powi(i32::try_from(steps.unsigned_abs()).unwrap_or(i32::MAX))
}

/// Round `mean x ratio` to a population count.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn population_threshold(mean: u32, ratio: f64) -> usize {
    let threshold = (f64::from(mean) * ratio).round();
    if threshold.is_nan() || threshold <= 0.0 {
        0
    } else {
        threshold as usize
    }
}

/// Apply a crypt's homeostatic pressure to an apoptosis rate.
///
/// A crypt with a dead neighbor exerts no pressure. Otherwise every whole
/// standard deviation above the mean multiplies the rate by
/// `crypt.apoptosis_multiplier`.
///
/// # Errors
///
/// Returns [`TissueError::UnknownCrypt`] if the crypt is not in the tissue.
pub fn apoptosis_effect(
    tissue: &Tissue,
    crypt: CryptId,
    rate: f64,
    params: &TissueParams,
) -> Result<f64, TissueError> {
    if tissue.has_dead_neighbor(crypt)? {
        return Ok(rate);
    }
    let distance = distance_from_mean(tissue.population(crypt)?, &params.crypt);
    if distance <= 0 {
        return Ok(rate);
    }
    Ok(rate * pow_steps(params.crypt.apoptosis_multiplier, distance))
}

/// Apply a crypt's homeostatic pressure to a division rate.
///
/// Every whole standard deviation below the mean multiplies the rate by
/// `crypt.division_multiplier`; a dead neighbor multiplies it again by
/// `crypt.dead_neighbor_division_multiplier`.
///
/// # Errors
///
/// Returns [`TissueError::UnknownCrypt`] if the crypt is not in the tissue.
pub fn division_effect(
    tissue: &Tissue,
    crypt: CryptId,
    rate: f64,
    params: &TissueParams,
) -> Result<f64, TissueError> {
    let mut rate = rate;
    let distance = distance_from_mean(tissue.population(crypt)?, &params.crypt);
    if distance < 0 {
        rate *= pow_steps(params.crypt.division_multiplier, distance);
    }
    if tissue.has_dead_neighbor(crypt)? {
        rate *= params.crypt.dead_neighbor_division_multiplier;
    }
    Ok(rate)
}

/// Apply a crypt's effect to a mutation rate. Crypts do not influence
/// mutation, so this is the identity.
pub const fn mutation_effect(_tissue: &Tissue, _crypt: CryptId, rate: f64) -> f64 {
    rate
}

/// Whether a crypt's population exceeds `round(mean x uncontrolled_growth_threshold)`.
///
/// # Errors
///
/// Returns [`TissueError::UnknownCrypt`] if the crypt is not in the tissue.
pub fn is_cancerous(
    tissue: &Tissue,
    crypt: CryptId,
    params: &TissueParams,
) -> Result<bool, TissueError> {
    let threshold = population_threshold(
        params.crypt.mean_cells,
        params.cancer.uncontrolled_growth_threshold,
    );
    Ok(tissue.population(crypt)? > threshold)
}

/// Whether a crypt's population is above the homeostatic mean.
///
/// # Errors
///
/// Returns [`TissueError::UnknownCrypt`] if the crypt is not in the tissue.
pub fn is_above_homeostatic(
    tissue: &Tissue,
    crypt: CryptId,
    params: &TissueParams,
) -> Result<bool, TissueError> {
    let mean = usize::try_from(params.crypt.mean_cells).unwrap_or(usize::MAX);
    Ok(tissue.population(crypt)? > mean)
}

/// Population at which a crypt becomes eligible to bifurcate.
pub fn bifurcation_threshold(params: &TissueParams) -> usize {
    population_threshold(
        params.crypt.mean_cells,
        params.crypt.bifurcation_threshold_ratio,
    )
}

// ---------------------------------------------------------------------------
// Cell rates
// ---------------------------------------------------------------------------

/// Baseline apoptosis rate. No crypt effect.
pub fn apoptosis_rate(cell: &StemCell, params: &TissueParams) -> f64 {
    let mutations = cell.mutations();
    let mut rate = params.stem_cell.apoptosis_rate;
    for effect in mutations.individual() {
        rate = effect.apoptosis_effect(rate);
    }
    rate = mutations
        .summary(MutationClass::DeleteriousApoptosis)
        .apoptosis_effect(rate);
    mutations
        .summary(MutationClass::BeneficialApoptosis)
        .apoptosis_effect(rate)
}

/// Feedback apoptosis rate: the base rate under the crypt's pressure.
///
/// # Errors
///
/// Returns [`TissueError::UnknownCrypt`] if the cell's crypt is missing.
pub fn feedback_apoptosis_rate(
    tissue: &Tissue,
    cell: &StemCell,
    params: &TissueParams,
) -> Result<f64, TissueError> {
    apoptosis_effect(tissue, cell.crypt(), params.stem_cell.apoptosis_rate, params)
}

fn division_mutation_effects(cell: &StemCell, rate: f64) -> f64 {
    let mutations = cell.mutations();
    let mut rate = rate;
    for effect in mutations.individual() {
        rate = effect.division_effect(rate);
    }
    rate = mutations
        .summary(MutationClass::BeneficialDivision)
        .division_effect(rate);
    mutations
        .summary(MutationClass::DeleteriousDivision)
        .division_effect(rate)
}

/// Symmetric division rate.
///
/// # Errors
///
/// Returns [`TissueError::UnknownCrypt`] if the cell's crypt is missing.
pub fn division_rate(
    tissue: &Tissue,
    cell: &StemCell,
    params: &TissueParams,
) -> Result<f64, TissueError> {
    let rate = division_effect(tissue, cell.crypt(), params.stem_cell.division_rate, params)?;
    Ok(division_mutation_effects(cell, rate))
}

/// Asymmetric division rate: the division rate without crypt pressure,
/// scaled by the asymmetric/symmetric ratio.
pub fn asymmetric_division_rate(cell: &StemCell, params: &TissueParams) -> f64 {
    division_mutation_effects(cell, params.stem_cell.division_rate)
        * f64::from(params.stem_cell.asymmetric_division_ratio)
}

fn capped_mutation_rate(tissue: &Tissue, cell: &StemCell, base: f64, max: f64) -> f64 {
    let mutations = cell.mutations();
    let mut rate = mutation_effect(tissue, cell.crypt(), base);
    for effect in mutations.individual() {
        rate = effect.mutation_effect(rate);
    }
    rate = mutations
        .summary(MutationClass::Mutator)
        .mutation_effect(rate);
    rate.min(max)
}

/// Probability that a division introduces a fitness mutation.
pub fn mutation_rate(tissue: &Tissue, cell: &StemCell, params: &TissueParams) -> f64 {
    capped_mutation_rate(
        tissue,
        cell,
        params.stem_cell.mutation_rate,
        params.stem_cell.mutation_rate_max,
    )
}

/// Per-division probability of a tumor-suppressor gene hit.
pub fn tsg_mutation_rate(tissue: &Tissue, cell: &StemCell, params: &TissueParams) -> f64 {
    capped_mutation_rate(
        tissue,
        cell,
        params.stem_cell.tsg_mutation_rate,
        params.stem_cell.tsg_mutation_rate_max,
    )
}

/// Transit-amplifying cells attributed to one stem cell: the compartment
/// size divided evenly (integer division) over the crypt's population.
///
/// # Errors
///
/// Returns [`TissueError::UnknownCrypt`] if the cell's crypt is missing.
pub fn transient_cells(
    tissue: &Tissue,
    cell: &StemCell,
    params: &TissueParams,
) -> Result<u32, TissueError> {
    let population = u32::try_from(tissue.population(cell.crypt())?).unwrap_or(u32::MAX);
    Ok(params
        .stem_cell
        .tac_size
        .checked_div(population)
        .unwrap_or(0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use stemsim_types::CellId;

    use super::*;
    use crate::config::LayoutParams;
    use crate::mutation::MutationEffect;

    /// Mean 2, stdev 1, multipliers 2, bifurcation ratio 2, growth threshold 4.
    fn params(rows: u32, cols: u32) -> TissueParams {
        let mut params = TissueParams::default();
        params.tissue = LayoutParams {
            rows,
            cols,
            wraparound: false,
        };
        params.crypt.mean_cells = 2;
        params.crypt.standard_deviation = 1;
        params.crypt.apoptosis_multiplier = 2.0;
        params.crypt.division_multiplier = 2.0;
        params.crypt.dead_neighbor_division_multiplier = 2.0;
        params.crypt.bifurcation_threshold_ratio = 2.0;
        params.cancer.uncontrolled_growth_threshold = 4.0;
        params.cancer.tsg_threshold = 2;
        params
    }

    fn tissue(params: &TissueParams) -> Tissue {
        Tissue::build(&params.tissue, params.crypt.mean_cells).unwrap()
    }

    #[test]
    fn distance_truncates_toward_zero() {
        let mut crypt = CryptParams::default();
        crypt.mean_cells = 10;
        crypt.standard_deviation = 3;
        assert_eq!(distance_from_mean(15, &crypt), 1);
        assert_eq!(distance_from_mean(12, &crypt), 0);
        assert_eq!(distance_from_mean(8, &crypt), 0);
        assert_eq!(distance_from_mean(6, &crypt), -1);
        crypt.standard_deviation = 0;
        assert_eq!(distance_from_mean(20, &crypt), 0);
    }

    #[test]
    fn apoptosis_effect_grows_above_mean() {
        let params = params(1, 1);
        let mut tissue = tissue(&params);
        let crypt = CryptId::new(0);
        assert_eq!(apoptosis_effect(&tissue, crypt, 1.0, &params).unwrap(), 1.0);

        let extra = tissue.add_cell(crypt).unwrap();
        assert_eq!(apoptosis_effect(&tissue, crypt, 1.0, &params).unwrap(), 2.0);
        tissue.add_cell(crypt).unwrap();
        assert_eq!(apoptosis_effect(&tissue, crypt, 1.0, &params).unwrap(), 4.0);

        tissue.remove_cell(extra).unwrap();
        tissue.remove_cell(CellId::new(0)).unwrap();
        assert_eq!(apoptosis_effect(&tissue, crypt, 1.0, &params).unwrap(), 1.0);
    }

    #[test]
    fn apoptosis_effect_suppressed_by_dead_neighbor() {
        let params = params(1, 2);
        let mut tissue = tissue(&params);
        let left = CryptId::new(0);
        tissue.add_cell(left).unwrap();
        assert_eq!(apoptosis_effect(&tissue, left, 1.0, &params).unwrap(), 2.0);

        for cell in tissue.crypt(CryptId::new(1)).unwrap().cells().collect::<Vec<_>>() {
            tissue.remove_cell(cell).unwrap();
        }
        assert_eq!(apoptosis_effect(&tissue, left, 1.0, &params).unwrap(), 1.0);
    }

    #[test]
    fn division_effect_grows_below_mean_and_next_to_dead_crypts() {
        let params = params(1, 2);
        let mut tissue = tissue(&params);
        let left = CryptId::new(0);
        assert_eq!(division_effect(&tissue, left, 1.0, &params).unwrap(), 1.0);

        tissue.remove_cell(CellId::new(0)).unwrap();
        assert_eq!(division_effect(&tissue, left, 1.0, &params).unwrap(), 2.0);

        for cell in tissue.crypt(CryptId::new(1)).unwrap().cells().collect::<Vec<_>>() {
            tissue.remove_cell(cell).unwrap();
        }
        assert_eq!(division_effect(&tissue, left, 1.0, &params).unwrap(), 4.0);
    }

    #[test]
    fn cancer_and_homeostasis_thresholds() {
        let params = params(1, 1);
        let mut tissue = tissue(&params);
        let crypt = CryptId::new(0);
        assert!(!is_above_homeostatic(&tissue, crypt, &params).unwrap());
        tissue.add_cell(crypt).unwrap();
        assert!(is_above_homeostatic(&tissue, crypt, &params).unwrap());

        // round(2 * 4) = 8; cancerous above 8.
        while tissue.population(crypt).unwrap() < 8 {
            tissue.add_cell(crypt).unwrap();
        }
        assert!(!is_cancerous(&tissue, crypt, &params).unwrap());
        tissue.add_cell(crypt).unwrap();
        assert!(is_cancerous(&tissue, crypt, &params).unwrap());
        assert_eq!(bifurcation_threshold(&params), 4);
    }

    #[test]
    fn cell_rates_compose_mutations() {
        let mut params = params(1, 1);
        params.stem_cell.apoptosis_rate = 1.0;
        params.stem_cell.division_rate = 1.0;
        params.stem_cell.asymmetric_division_ratio = 3;
        let mut tissue = tissue(&params);
        let cell_id = CellId::new(0);
        let cell = tissue.cell_mut(cell_id).unwrap();
        cell.add_mutation(
            MutationEffect::new(MutationClass::DeleteriousApoptosis, 2.0),
            true,
        );
        cell.add_mutation(
            MutationEffect::new(MutationClass::BeneficialApoptosis, 0.25),
            false,
        );
        cell.add_mutation(
            MutationEffect::new(MutationClass::BeneficialDivision, 4.0),
            true,
        );

        let cell = tissue.cell(cell_id).unwrap();
        assert_eq!(apoptosis_rate(cell, &params), 0.5);
        assert_eq!(division_rate(&tissue, cell, &params).unwrap(), 4.0);
        assert_eq!(asymmetric_division_rate(cell, &params), 12.0);
        // Feedback apoptosis ignores mutations.
        assert_eq!(feedback_apoptosis_rate(&tissue, cell, &params).unwrap(), 1.0);
    }

    #[test]
    fn mutation_rates_are_capped() {
        let mut params = params(1, 1);
        params.stem_cell.mutation_rate = 0.1;
        params.stem_cell.mutation_rate_max = 0.3;
        params.stem_cell.tsg_mutation_rate = 0.01;
        params.stem_cell.tsg_mutation_rate_max = 0.5;
        let mut tissue = tissue(&params);
        let cell_id = CellId::new(0);
        let mutator = MutationEffect::new(MutationClass::Mutator, 4.0);
        tissue.cell_mut(cell_id).unwrap().add_mutation(mutator, true);

        let cell = tissue.cell(cell_id).unwrap();
        assert_eq!(mutation_rate(&tissue, cell, &params), 0.3);
        assert_eq!(tsg_mutation_rate(&tissue, cell, &params), 0.04);
    }

    #[test]
    fn transient_cells_use_integer_division() {
        let mut params = params(1, 1);
        params.stem_cell.tac_size = 7;
        let tissue = tissue(&params);
        let cell = tissue.cell(CellId::new(0)).unwrap();
        assert_eq!(transient_cells(&tissue, cell, &params).unwrap(), 3);
    }
}
