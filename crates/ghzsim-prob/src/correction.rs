use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CorrectionError {
    #[error("total round count must be positive")]
    ZeroRounds,
    #[error("sample count {samples} must lie in [1, {total_rounds}]")]
    InvalidSampleCount { samples: u64, total_rounds: u64 },
    #[error("tolerance must lie in (0, 1], got {0}")]
    InvalidTolerance(f64),
}

/// Finite-sample correction added to an empirical error rate.
///
/// With `N` rounds in total, of which `m` were sampled (without replacement)
/// to estimate the rate, the true rate over the unsampled rounds exceeds the
/// estimate by more than
///
/// ```text
/// sqrt( log2(1/eps) * (N + m)(m + 1) / (N * m^2) )
/// ```
///
/// with probability at most `eps`.
///
/// # Parameters
/// - `total_rounds`: `N`, the number of rounds the sample was drawn from.
/// - `samples`: `m`, the number of rounds that entered the estimate.
/// - `tolerance`: `eps`, the accepted probability of a misleading estimate.
///
/// # Returns
/// A non-negative correction term.
pub fn statistical_correction(
    total_rounds: u64,
    samples: u64,
    tolerance: f64,
) -> Result<f64, CorrectionError> {
    if total_rounds == 0 {
        return Err(CorrectionError::ZeroRounds);
    }
    if samples == 0 || samples > total_rounds {
        return Err(CorrectionError::InvalidSampleCount {
            samples,
            total_rounds,
        });
    }
    if !(tolerance > 0.0 && tolerance <= 1.0) {
        return Err(CorrectionError::InvalidTolerance(tolerance));
    }

    let n = total_rounds as f64;
    let m = samples as f64;
    let confidence = (1.0 / tolerance).log2();
    Ok((confidence * (n + m) * (m + 1.0) / (n * m * m)).sqrt())
}
