//! Fitness mutations and their per-cell accumulation.
//!
//! A [`MutationEffect`] is an immutable descriptor: a class plus the
//! multiplier it applies to one rate. Every mutation of a class in a run
//! shares the same descriptor, produced by the [`MutationCatalog`].
//!
//! Cells usually fold each new effect into a per-class
//! [`MutationSummary`] (a count and a running product) rather than storing
//! it. The [`MutationLoad`] keeps both forms: the list of individually
//! stored effects in acquisition order, and the five summaries.

use serde::{Deserialize, Serialize};
use stemsim_types::MutationClass;

use crate::config::MutationParams;

/// A shared, immutable mutation effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationEffect {
    class: MutationClass,
    multiplier: f64,
}

impl MutationEffect {
    /// Create an effect of the given class.
    pub const fn new(class: MutationClass, multiplier: f64) -> Self {
        Self { class, multiplier }
    }

    /// The mutation class.
    pub const fn class(&self) -> MutationClass {
        self.class
    }

    /// The multiplier applied to the affected rate.
    pub const fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Apply this effect to an apoptosis rate.
    pub fn apoptosis_effect(&self, rate: f64) -> f64 {
        if self.class.affects_apoptosis() {
            rate * self.multiplier
        } else {
            rate
        }
    }

    /// Apply this effect to a division rate.
    pub fn division_effect(&self, rate: f64) -> f64 {
        if self.class.affects_division() {
            rate * self.multiplier
        } else {
            rate
        }
    }

    /// Apply this effect to a mutation rate.
    pub fn mutation_effect(&self, rate: f64) -> f64 {
        if self.class.affects_mutation() {
            rate * self.multiplier
        } else {
            rate
        }
    }
}

/// Running tally of all summarized mutations of one class in one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationSummary {
    count: u32,
    apoptosis: f64,
    division: f64,
    mutation: f64,
}

impl Default for MutationSummary {
    fn default() -> Self {
        Self {
            count: 0,
            apoptosis: 1.0,
            division: 1.0,
            mutation: 1.0,
        }
    }
}

impl MutationSummary {
    /// Number of mutations folded into this summary.
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Fold one more effect into the tally.
    pub fn summarize(&mut self, effect: &MutationEffect) {
        self.count = self.count.saturating_add(1);
        self.apoptosis = effect.apoptosis_effect(self.apoptosis);
        self.division = effect.division_effect(self.division);
        self.mutation = effect.mutation_effect(self.mutation);
    }

    /// Apply the accumulated apoptosis multiplier.
    pub fn apoptosis_effect(&self, rate: f64) -> f64 {
        rate * self.apoptosis
    }

    /// Apply the accumulated division multiplier.
    pub fn division_effect(&self, rate: f64) -> f64 {
        rate * self.division
    }

    /// Apply the accumulated mutation multiplier.
    pub fn mutation_effect(&self, rate: f64) -> f64 {
        rate * self.mutation
    }
}

/// Every mutation a cell carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationLoad {
    individual: Vec<MutationEffect>,
    deleterious_apoptosis: MutationSummary,
    deleterious_division: MutationSummary,
    beneficial_apoptosis: MutationSummary,
    beneficial_division: MutationSummary,
    mutator: MutationSummary,
}

impl MutationLoad {
    /// Record a new mutation, either folded into its class summary or
    /// stored individually.
    pub fn add(&mut self, effect: MutationEffect, summarize: bool) {
        if summarize {
            self.summary_mut(effect.class()).summarize(&effect);
        } else {
            self.individual.push(effect);
        }
    }

    /// Individually stored effects, in acquisition order.
    pub fn individual(&self) -> &[MutationEffect] {
        &self.individual
    }

    /// The summary for one class.
    pub const fn summary(&self, class: MutationClass) -> &MutationSummary {
        match class {
            MutationClass::DeleteriousApoptosis => &self.deleterious_apoptosis,
            MutationClass::DeleteriousDivision => &self.deleterious_division,
            MutationClass::BeneficialApoptosis => &self.beneficial_apoptosis,
            MutationClass::BeneficialDivision => &self.beneficial_division,
            MutationClass::Mutator => &self.mutator,
        }
    }

    const fn summary_mut(&mut self, class: MutationClass) -> &mut MutationSummary {
        match class {
            MutationClass::DeleteriousApoptosis => &mut self.deleterious_apoptosis,
            MutationClass::DeleteriousDivision => &mut self.deleterious_division,
            MutationClass::BeneficialApoptosis => &mut self.beneficial_apoptosis,
            MutationClass::BeneficialDivision => &mut self.beneficial_division,
            MutationClass::Mutator => &mut self.mutator,
        }
    }

    /// Number of mutations of a class, summarized or individual.
    pub fn count(&self, class: MutationClass) -> usize {
        let summarized = usize::try_from(self.summary(class).count()).unwrap_or(usize::MAX);
        let individual = self
            .individual
            .iter()
            .filter(|effect| effect.class() == class)
            .count();
        summarized.saturating_add(individual)
    }

    /// Total number of mutations of every class.
    pub fn total(&self) -> usize {
        MutationClass::ALL
            .iter()
            .map(|class| self.count(*class))
            .fold(0, usize::saturating_add)
    }

    /// Whether the cell carries at least one mutator mutation.
    pub fn is_mutator(&self) -> bool {
        self.count(MutationClass::Mutator) > 0
    }
}

/// The shared effect descriptors of a run and the probabilities used to
/// pick among them.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationCatalog {
    entries: Vec<(MutationEffect, f64)>,
}

impl MutationCatalog {
    /// Build the catalog from configured class parameters.
    pub fn from_params(params: &MutationParams) -> Self {
        let entries = MutationClass::ALL
            .iter()
            .map(|class| {
                let class_params = params.class(*class);
                (
                    MutationEffect::new(*class, class_params.multiplier),
                    class_params.probability,
                )
            })
            .collect();
        Self { entries }
    }

    /// Pick a mutation class from a uniform draw in `[0, 1)`.
    ///
    /// Classes are tested cumulatively in [`MutationClass::ALL`] order; a
    /// draw at or above the summed probabilities yields no mutation.
    pub fn draw(&self, uniform: f64) -> Option<MutationEffect> {
        let mut cumulative = 0.0;
        for (effect, probability) in &self.entries {
            cumulative += probability;
            if uniform < cumulative {
                return Some(*effect);
            }
        }
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn catalog() -> MutationCatalog {
        MutationCatalog::from_params(&MutationParams::default())
    }

    #[test]
    fn effect_only_touches_its_rate() {
        let effect = MutationEffect::new(MutationClass::DeleteriousApoptosis, 1.5);
        assert_eq!(effect.apoptosis_effect(2.0), 3.0);
        assert_eq!(effect.division_effect(2.0), 2.0);
        assert_eq!(effect.mutation_effect(2.0), 2.0);
    }

    #[test]
    fn summary_multiplies_effects() {
        let effect = MutationEffect::new(MutationClass::BeneficialDivision, 2.0);
        let mut summary = MutationSummary::default();
        summary.summarize(&effect);
        summary.summarize(&effect);
        assert_eq!(summary.count(), 2);
        assert_eq!(summary.division_effect(1.0), 4.0);
        assert_eq!(summary.apoptosis_effect(1.0), 1.0);
    }

    #[test]
    fn clone_is_independent() {
        let effect = MutationEffect::new(MutationClass::Mutator, 2.0);
        let mut parent = MutationLoad::default();
        parent.add(effect, true);
        let mut daughter = parent.clone();
        daughter.add(effect, true);
        assert_eq!(parent.count(MutationClass::Mutator), 1);
        assert_eq!(daughter.count(MutationClass::Mutator), 2);
        assert_eq!(
            parent.summary(MutationClass::Mutator).mutation_effect(1.0),
            2.0
        );
    }

    #[test]
    fn unsummarized_mutations_are_kept_in_order() {
        let mut load = MutationLoad::default();
        load.add(MutationEffect::new(MutationClass::Mutator, 2.0), false);
        load.add(MutationEffect::new(MutationClass::DeleteriousDivision, 0.5), false);
        assert_eq!(load.individual().len(), 2);
        assert_eq!(
            load.individual().first().map(MutationEffect::class),
            Some(MutationClass::Mutator)
        );
        assert_eq!(load.total(), 2);
        assert!(load.is_mutator());
    }

    #[test]
    fn draw_walks_cumulative_probabilities() {
        let catalog = catalog();
        // Defaults: 0.2, 0.2, 0.05, 0.05, 0.01.
        assert_eq!(
            catalog.draw(0.0).map(|e| e.class()),
            Some(MutationClass::DeleteriousApoptosis)
        );
        assert_eq!(
            catalog.draw(0.3).map(|e| e.class()),
            Some(MutationClass::DeleteriousDivision)
        );
        assert_eq!(
            catalog.draw(0.42).map(|e| e.class()),
            Some(MutationClass::BeneficialApoptosis)
        );
        assert_eq!(
            catalog.draw(0.47).map(|e| e.class()),
            Some(MutationClass::BeneficialDivision)
        );
        assert_eq!(
            catalog.draw(0.505).map(|e| e.class()),
            Some(MutationClass::Mutator)
        );
        assert!(catalog.draw(0.6).is_none());
    }

    #[test]
    fn catalog_shares_one_descriptor_per_class() {
        let catalog = catalog();
        let first = catalog.draw(0.505).unwrap();
        let second = catalog.draw(0.509).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.multiplier(), 2.0);
    }
}
