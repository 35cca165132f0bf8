//! Assigns each round of a run to verification, estimation or message use.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SamplingError {
    #[error("cannot sample {requested} {purpose} rounds from a population of {available}")]
    InsufficientPopulation {
        purpose: &'static str,
        requested: u64,
        available: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundCategory {
    Verification,
    Estimation,
    /// Key material, or anonymous transmission.
    Message,
}

/// Where the parameter-estimation error rate comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rounds", rename_all = "snake_case")]
pub enum EstimationPolicy {
    /// Sample this many estimation rounds from the rounds not used for
    /// verification.
    Separate(u64),
    /// Spend no extra rounds and reuse the verification error rate.
    ReuseVerification,
}

impl EstimationPolicy {
    pub fn nr_rounds(self) -> u64 {
        match self {
            EstimationPolicy::Separate(n) => n,
            EstimationPolicy::ReuseVerification => 0,
        }
    }
}

/// Source of public randomness for round classification. Every party
/// derives the same partition from the same seed.
pub fn public_randomness(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Draw `amount` distinct elements of `population` uniformly at random.
pub fn sample_rounds<R: Rng + ?Sized>(
    rng: &mut R,
    population: &[u64],
    amount: u64,
    purpose: &'static str,
) -> Result<BTreeSet<u64>, SamplingError> {
    let available = population.len() as u64;
    if amount > available {
        return Err(SamplingError::InsufficientPopulation {
            purpose,
            requested: amount,
            available,
        });
    }
    Ok(index::sample(rng, population.len(), amount as usize)
        .into_iter()
        .map(|i| population[i])
        .collect())
}

/// Disjoint verification and estimation sets over `[0, nr_rounds)`; every
/// other round is a message round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundPartition {
    nr_rounds: u64,
    verification: BTreeSet<u64>,
    estimation: BTreeSet<u64>,
    reuses_verification: bool,
}

impl RoundPartition {
    /// Sample `nr_verification` rounds from the full range, then estimation
    /// rounds from the remainder according to `estimation`.
    pub fn classify<R: Rng + ?Sized>(
        rng: &mut R,
        nr_rounds: u64,
        nr_verification: u64,
        estimation: EstimationPolicy,
    ) -> Result<Self, SamplingError> {
        let all: Vec<u64> = (0..nr_rounds).collect();
        let verification = sample_rounds(rng, &all, nr_verification, "verification")?;

        let (estimation_set, reuses_verification) = match estimation {
            EstimationPolicy::Separate(nr_estimation) => {
                let rest: Vec<u64> = all
                    .into_iter()
                    .filter(|r| !verification.contains(r))
                    .collect();
                (sample_rounds(rng, &rest, nr_estimation, "estimation")?, false)
            }
            EstimationPolicy::ReuseVerification => (BTreeSet::new(), true),
        };

        Ok(Self {
            nr_rounds,
            verification,
            estimation: estimation_set,
            reuses_verification,
        })
    }

    /// Only estimation rounds, sampled from the full range.
    pub fn estimation_only<R: Rng + ?Sized>(
        rng: &mut R,
        nr_rounds: u64,
        nr_estimation: u64,
    ) -> Result<Self, SamplingError> {
        Self::classify(rng, nr_rounds, 0, EstimationPolicy::Separate(nr_estimation))
    }

    pub fn nr_rounds(&self) -> u64 {
        self.nr_rounds
    }

    pub fn verification(&self) -> &BTreeSet<u64> {
        &self.verification
    }

    pub fn estimation(&self) -> &BTreeSet<u64> {
        &self.estimation
    }

    /// Whether the estimation error rate is taken from the verification
    /// rounds instead.
    pub fn reuses_verification(&self) -> bool {
        self.reuses_verification
    }

    pub fn category(&self, round: u64) -> Option<RoundCategory> {
        if round >= self.nr_rounds {
            None
        } else if self.verification.contains(&round) {
            Some(RoundCategory::Verification)
        } else if self.estimation.contains(&round) {
            Some(RoundCategory::Estimation)
        } else {
            Some(RoundCategory::Message)
        }
    }

    pub fn message_rounds(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.nr_rounds)
            .filter(|r| !self.verification.contains(r) && !self.estimation.contains(r))
    }
}
