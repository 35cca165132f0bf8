//! Empirical error rates over sets of rounds.

use ghzsim_protocol::OutcomeTable;
use ghzsim_sim::Basis;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EstimationError {
    #[error("none of the {requested} sampled rounds carries a usable correlation")]
    InsufficientCorrelatedRounds { requested: u64 },
    #[error("round {round} is outside the {nr_rounds} recorded rounds")]
    RoundOutOfRange { round: u64, nr_rounds: u64 },
    #[error("round {round} mixes Z with X/Y measurements")]
    MixedBases { round: u64 },
}

/// Parity the outcomes of an X/Y round must have on a perfect GHZ state,
/// from the sum of the basis labels (X = 0, Y = 1).
///
/// `0 mod 4` expects even parity and `2 mod 4` odd parity; an odd number of
/// Y measurements carries no correlation and yields `None`.
pub fn expected_parity(label_sum: u32) -> Option<u8> {
    match label_sum % 4 {
        0 => Some(0),
        2 => Some(1),
        _ => None,
    }
}

/// Error counts over one set of rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorRateEstimate {
    /// Rounds that entered the estimate.
    pub included: u64,
    /// Included rounds whose outcomes contradict the GHZ correlation.
    pub errors: u64,
    /// Sampled rounds dropped for carrying no correlation.
    pub excluded: u64,
}

impl ErrorRateEstimate {
    pub fn rate(&self) -> f64 {
        self.errors as f64 / self.included as f64
    }
}

/// Judge one round. `None` when the round carries no usable correlation.
fn round_error(bits: &[u8], bases: Option<&[Basis]>, round: u64) -> Result<Option<bool>, EstimationError> {
    let parity = bits.iter().fold(0u8, |acc, b| acc ^ (b & 1));
    match bases {
        Some(bases) => {
            let mut label_sum = 0u32;
            for basis in bases {
                let label = basis.label().ok_or(EstimationError::MixedBases { round })?;
                label_sum += u32::from(label);
            }
            Ok(expected_parity(label_sum).map(|expected| parity != expected))
        }
        // Z basis: every participant holds the same bit.
        None => Ok(Some(bits.iter().any(|b| *b != bits[0]))),
    }
}

/// Error rate of `rounds` in `table`.
///
/// Fails when no requested round survives filtering, so the rate is never
/// taken over zero samples.
pub fn estimate_error_rate<I>(table: &OutcomeTable, rounds: I) -> Result<ErrorRateEstimate, EstimationError>
where
    I: IntoIterator<Item = u64>,
{
    let nr_rounds = table.nr_rounds() as u64;
    let mut estimate = ErrorRateEstimate::default();
    for round in rounds {
        let bits = table
            .bits(round as usize)
            .ok_or(EstimationError::RoundOutOfRange { round, nr_rounds })?;
        match round_error(bits, table.bases(round as usize), round)? {
            Some(error) => {
                estimate.included += 1;
                estimate.errors += u64::from(error);
            }
            None => estimate.excluded += 1,
        }
    }
    if estimate.included == 0 {
        return Err(EstimationError::InsufficientCorrelatedRounds {
            requested: estimate.excluded,
        });
    }
    Ok(estimate)
}
