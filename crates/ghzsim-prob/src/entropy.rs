use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum EntropyError {
    #[error("error rate {rate} is outside the binary entropy domain [0, 0.5]")]
    OutOfDomain { rate: f64 },
}

/// Binary Shannon entropy `h(p) = -p log2 p - (1-p) log2 (1-p)`.
///
/// Only the lower half `[0, 0.5]` is accepted: a larger error rate means the
/// correlation carries no usable secrecy, and a negative (or NaN) rate means
/// an estimate went wrong upstream. Both are reported as
/// [`EntropyError::OutOfDomain`] so callers can degrade to a zero length.
///
/// # Parameters
/// - `p`: Error rate, already including any statistical correction.
///
/// # Returns
/// `h(p)` in `[0, 1]`.
pub fn binary_entropy(p: f64) -> Result<f64, EntropyError> {
    if !(0.0..=0.5).contains(&p) {
        return Err(EntropyError::OutOfDomain { rate: p });
    }
    if p == 0.0 {
        return Ok(0.0);
    }
    let q = 1.0 - p;
    Ok(-p * p.log2() - q * q.log2())
}

/// `h(p)` on the full unit interval, using the reflection `h(p) = h(1 - p)`.
///
/// Used where the argument is a fraction of rounds rather than an error rate
/// (e.g. the cost of sharing a verification schedule), so values above one
/// half are legitimate.
pub fn binary_entropy_unit(p: f64) -> Result<f64, EntropyError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(EntropyError::OutOfDomain { rate: p });
    }
    binary_entropy(p.min(1.0 - p))
}
