//! The simulation's single source of randomness.
//!
//! Every stochastic decision in a run (wait times, mutation rolls, TSG
//! rolls, bifurcation targets) draws from one [`RandomSource`] owned by the
//! [`SimulationState`](crate::state::SimulationState). Runs seeded with the
//! same value therefore replay identically.
//!
//! [`SeededRandom`] is the production source. [`StubRandom`] returns fixed
//! values so that transitions can be tested without statistics.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp};

/// Errors raised when a distribution cannot be sampled.
#[derive(Debug, thiserror::Error)]
pub enum RandomError {
    /// An exponential rate was negative or NaN.
    #[error("invalid exponential rate {rate}")]
    InvalidRate {
        /// The rejected rate.
        rate: f64,
    },

    /// The exponential distribution refused the rate.
    #[error("cannot sample exponential with rate {rate}: {source}")]
    Distribution {
        /// The rejected rate.
        rate: f64,
        /// Error reported by the distribution.
        #[source]
        source: rand_distr::ExpError,
    },
}

/// Uniform, exponential, and index draws.
pub trait RandomSource: Send {
    /// A value in `[0, 1)`.
    fn uniform01(&mut self) -> f64;

    /// A wait drawn from the exponential distribution with mean `1 / rate`.
    ///
    /// A rate of zero yields positive infinity.
    ///
    /// # Errors
    ///
    /// Returns an error if `rate` is negative or NaN.
    fn exponential(&mut self, rate: f64) -> Result<f64, RandomError>;

    /// A uniformly chosen index below `len`, or `None` if `len` is zero.
    fn index(&mut self, len: usize) -> Option<usize>;
}

fn check_rate(rate: f64) -> Result<(), RandomError> {
    if rate.is_nan() || rate < 0.0 {
        return Err(RandomError::InvalidRate { rate });
    }
    Ok(())
}

/// ChaCha8-backed random source.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    /// Create a source whose whole stream is determined by `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn uniform01(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn exponential(&mut self, rate: f64) -> Result<f64, RandomError> {
        if rate == 0.0 {
            return Ok(f64::INFINITY);
        }
        let exp = Exp::new(rate).map_err(|source| RandomError::Distribution { rate, source })?;
        Ok(exp.sample(&mut self.rng))
    }

    fn index(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.rng.random_range(0..len))
    }
}

/// Deterministic source for tests.
///
/// `uniform01` always returns the configured value, `exponential` returns
/// the distribution's mean `1 / rate`, and `index` always picks `0`.
#[derive(Debug, Clone, Copy)]
pub struct StubRandom {
    uniform: f64,
}

impl StubRandom {
    /// Create a stub returning `uniform` from every uniform draw.
    pub const fn new(uniform: f64) -> Self {
        Self { uniform }
    }
}

impl Default for StubRandom {
    /// A stub whose uniform draws never succeed against a probability
    /// below one.
    fn default() -> Self {
        Self::new(0.999_999)
    }
}

impl RandomSource for StubRandom {
    fn uniform01(&mut self) -> f64 {
        self.uniform
    }

    fn exponential(&mut self, rate: f64) -> Result<f64, RandomError> {
        check_rate(rate)?;
        Ok(1.0 / rate)
    }

    fn index(&mut self, len: usize) -> Option<usize> {
        (len > 0).then_some(0)
    }
}
