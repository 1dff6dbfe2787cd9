use super::genome::random_gene;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Probability, per gene, of drawing a fresh value instead of inheriting one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct MutationRate {
    value: f64,
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("mutation_rate must be between 0.0 and 1.0, got: {0}")]
pub struct MutationRateOutOfRange(f64);

impl MutationRate {
    pub fn new(value: f64) -> Result<Self, MutationRateOutOfRange> {
        if !(0.0..=1.0).contains(&value) {
            return Err(MutationRateOutOfRange(value));
        }

        Ok(Self { value })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Picks the child's value for one gene.
    ///
    /// Mutates with probability `value`; otherwise takes the mother's or the
    /// father's gene with equal odds.
    pub(crate) fn inherit<R: Rng>(&self, rng: &mut R, mother: f64, father: f64) -> f64 {
        if rng.random_range(0.0..1.0) < self.value {
            return random_gene(rng);
        }

        if rng.random_bool(0.5) { mother } else { father }
    }
}

impl TryFrom<f64> for MutationRate {
    type Error = MutationRateOutOfRange;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MutationRate> for f64 {
    fn from(rate: MutationRate) -> Self {
        rate.value
    }
}
