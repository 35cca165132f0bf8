use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entropy::{binary_entropy, binary_entropy_unit, EntropyError};

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SecureLengthError {
    #[error(transparent)]
    Entropy(#[from] EntropyError),
    #[error("verification error rate {rate} leaves no detection margin (must lie in [0, 1))")]
    VerificationRate { rate: f64 },
    #[error("anonymity tolerance must lie in (0, 1), got {0}")]
    AnonymityTolerance(f64),
    #[error("{consumed} overhead rounds exceed the {total_rounds} rounds available")]
    OverheadExceedsRounds { consumed: u64, total_rounds: u64 },
}

/// An empirical error rate together with its finite-sample correction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CorrectedRate {
    pub rate: f64,
    pub correction: f64,
}

impl CorrectedRate {
    pub fn new(rate: f64, correction: f64) -> Self {
        Self { rate, correction }
    }

    /// A rate used without statistical correction.
    pub fn exact(rate: f64) -> Self {
        Self {
            rate,
            correction: 0.0,
        }
    }

    /// The rate entering the entropy evaluation.
    pub fn value(&self) -> f64 {
        self.rate + self.correction
    }
}

impl std::fmt::Display for CorrectedRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3} + ({:.3})", self.rate, self.correction)
    }
}

fn leftover_rounds(total_rounds: u64, consumed: u64) -> Result<f64, SecureLengthError> {
    total_rounds
        .checked_sub(consumed)
        .map(|left| left as f64)
        .ok_or(SecureLengthError::OverheadExceedsRounds {
            consumed,
            total_rounds,
        })
}

/// Secure length when the coordinator is trusted.
///
/// `(1 - h(p)) * (N - m)`, where `m` rounds were spent on estimating `p`.
pub fn single_rate_length(
    estimation: CorrectedRate,
    total_rounds: u64,
    estimation_rounds: u64,
) -> Result<f64, SecureLengthError> {
    let left = leftover_rounds(total_rounds, estimation_rounds)?;
    let h = binary_entropy(estimation.value())?;
    Ok((1.0 - h) * left)
}

/// Secure length when the coordinator is untrusted and both verification
/// and parameter estimation consumed rounds.
///
/// `(1 - h(p_VER) - h(p_PE)) * (N - m_VER - m_PE)`, clamped to zero when
/// the two penalties together exceed one.
pub fn two_rate_length(
    verification: CorrectedRate,
    estimation: CorrectedRate,
    total_rounds: u64,
    verification_rounds: u64,
    estimation_rounds: u64,
) -> Result<f64, SecureLengthError> {
    let left = leftover_rounds(total_rounds, verification_rounds + estimation_rounds)?;
    let h_ver = binary_entropy(verification.value())?;
    let h_est = binary_entropy(estimation.value())?;
    let bracket = 1.0 - h_ver - h_est;
    if bracket <= 0.0 {
        return Ok(0.0);
    }
    Ok(bracket * left)
}

/// Fraction of rounds retained after catching a dishonest coordinator.
///
/// `1 / ceil(ln(anon_tolerance) / ln(p))`: the number of verification hits
/// needed before a deviation survives undetected with probability at most
/// `anon_tolerance`. A rate of exactly zero is the `p -> 0` limit (a single
/// hit suffices) and yields a penalty of one.
pub fn verification_penalty(
    verification: CorrectedRate,
    anon_tolerance: f64,
) -> Result<f64, SecureLengthError> {
    if !(anon_tolerance > 0.0 && anon_tolerance < 1.0) {
        return Err(SecureLengthError::AnonymityTolerance(anon_tolerance));
    }
    let p = verification.value();
    if !(0.0..1.0).contains(&p) {
        return Err(SecureLengthError::VerificationRate { rate: p });
    }
    if p == 0.0 {
        return Ok(1.0);
    }
    let hits = (anon_tolerance.ln() / p.ln()).ceil();
    Ok(1.0 / hits)
}

/// Secure length under the anonymity-oriented security definition.
///
/// `penalty_VER * (1/2)(1 - h(p_PE)) * (N - m_VER - m_PE)`.
pub fn anonymity_weighted_length(
    verification: CorrectedRate,
    estimation: CorrectedRate,
    anon_tolerance: f64,
    total_rounds: u64,
    verification_rounds: u64,
    estimation_rounds: u64,
) -> Result<f64, SecureLengthError> {
    let left = leftover_rounds(total_rounds, verification_rounds + estimation_rounds)?;
    let penalty_ver = verification_penalty(verification, anon_tolerance)?;
    let penalty_est = 0.5 * (1.0 - binary_entropy(estimation.value())?);
    Ok(penalty_ver * penalty_est * left)
}

/// Bits of pre-shared key needed to agree on which `verification_rounds` of
/// `total_rounds` are verification rounds: `h(m/N) * N`.
pub fn preshared_key_length(
    verification_rounds: u64,
    total_rounds: u64,
) -> Result<f64, SecureLengthError> {
    if total_rounds == 0 || verification_rounds > total_rounds {
        return Err(SecureLengthError::OverheadExceedsRounds {
            consumed: verification_rounds,
            total_rounds,
        });
    }
    let n = total_rounds as f64;
    Ok(binary_entropy_unit(verification_rounds as f64 / n)? * n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trusted_scenario() {
        // (1 - h(0.02)) * 800
        let len = single_rate_length(CorrectedRate::exact(0.02), 1000, 200).unwrap();
        assert!((len - 686.85).abs() < 0.01, "len = {len}");
    }

    #[test]
    fn untrusted_two_rate_scenario() {
        // (1 - 0 - h(0.05)) * 600
        let len = two_rate_length(
            CorrectedRate::exact(0.0),
            CorrectedRate::exact(0.05),
            1000,
            200,
            200,
        )
        .unwrap();
        assert!((len - 428.16).abs() < 0.01, "len = {len}");
    }

    #[test]
    fn degenerate_rate_is_a_domain_error() {
        let err = single_rate_length(CorrectedRate::exact(0.6), 1000, 200).unwrap_err();
        assert!(matches!(
            err,
            SecureLengthError::Entropy(EntropyError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn correction_pushes_rate_out_of_domain() {
        let rate = CorrectedRate::new(0.3, 0.25);
        assert!(single_rate_length(rate, 1000, 200).is_err());
    }

    #[test]
    fn two_rate_clamps_negative_bracket() {
        // h(0.2) + h(0.2) ~ 1.44 > 1
        let len = two_rate_length(
            CorrectedRate::exact(0.2),
            CorrectedRate::exact(0.2),
            1000,
            100,
            100,
        )
        .unwrap();
        assert_eq!(len, 0.0);
    }

    #[test]
    fn overhead_larger_than_rounds_is_rejected() {
        assert!(matches!(
            two_rate_length(
                CorrectedRate::exact(0.0),
                CorrectedRate::exact(0.0),
                100,
                60,
                60
            ),
            Err(SecureLengthError::OverheadExceedsRounds { .. })
        ));
    }

    #[test]
    fn verification_penalty_values() {
        // ln(1e-8) / ln(0.2) = 11.45, so 12 hits
        let p = verification_penalty(CorrectedRate::exact(0.2), 1e-8).unwrap();
        assert!((p - 1.0 / 12.0).abs() < 1e-12);
        // Perfect verification keeps every round.
        assert_eq!(
            verification_penalty(CorrectedRate::exact(0.0), 1e-8).unwrap(),
            1.0
        );
        assert!(verification_penalty(CorrectedRate::exact(1.0), 1e-8).is_err());
        assert!(verification_penalty(CorrectedRate::exact(0.1), 1.0).is_err());
        assert!(verification_penalty(CorrectedRate::exact(0.1), 0.0).is_err());
    }

    #[test]
    fn anonymity_weighted_length_value() {
        // penalty_VER = 1/12, penalty_EST = (1 - h(0.05)) / 2, 600 rounds left
        let len = anonymity_weighted_length(
            CorrectedRate::exact(0.2),
            CorrectedRate::exact(0.05),
            1e-8,
            1000,
            200,
            200,
        )
        .unwrap();
        let expected = (1.0 / 12.0) * 0.5 * (1.0 - binary_entropy(0.05).unwrap()) * 600.0;
        assert!((len - expected).abs() < 1e-9);
    }

    #[test]
    fn preshared_key_cost() {
        let cost = preshared_key_length(500, 1000).unwrap();
        assert!((cost - 1000.0).abs() < 1e-9);
        assert_eq!(preshared_key_length(0, 1000).unwrap(), 0.0);
        assert!(preshared_key_length(10, 0).is_err());
    }

    #[test]
    fn corrected_rate_display() {
        let shown = CorrectedRate::new(0.25, 0.0123).to_string();
        assert_eq!(shown, "0.250 + (0.012)");
    }

    use proptest::prelude::*;
    use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence, RngAlgorithm};

    fn prob_proptest_config() -> ProptestConfig {
        ProptestConfig {
            cases: 64,
            source_file: Some(file!()),
            failure_persistence: Some(Box::new(FileFailurePersistence::WithSource(
                "proptest-regressions",
            ))),
            rng_algorithm: RngAlgorithm::ChaCha,
            ..ProptestConfig::default()
        }
    }

    proptest! {
        #![proptest_config(prob_proptest_config())]

        /// For fixed N and m the length never grows with the error rate.
        #[test]
        fn single_rate_non_increasing(a in 0.0f64..=0.5, b in 0.0f64..=0.5) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let l_lo = single_rate_length(CorrectedRate::exact(lo), 1000, 200).unwrap();
            let l_hi = single_rate_length(CorrectedRate::exact(hi), 1000, 200).unwrap();
            prop_assert!(l_hi <= l_lo + 1e-9, "len({hi})={l_hi} > len({lo})={l_lo}");
        }

        /// Lengths are never negative on the valid domain.
        #[test]
        fn two_rate_non_negative(v in 0.0f64..=0.5, e in 0.0f64..=0.5) {
            let len = two_rate_length(
                CorrectedRate::exact(v),
                CorrectedRate::exact(e),
                1000,
                200,
                200,
            ).unwrap();
            prop_assert!(len >= 0.0);
        }

        /// The verification penalty is a fraction in (0, 1].
        #[test]
        fn penalty_is_a_fraction(p in 0.0f64..0.99, tol_exp in -12i32..=-1) {
            let pen = verification_penalty(CorrectedRate::exact(p), 10f64.powi(tol_exp)).unwrap();
            prop_assert!(pen > 0.0 && pen <= 1.0, "penalty({p}) = {pen}");
        }
    }
}
