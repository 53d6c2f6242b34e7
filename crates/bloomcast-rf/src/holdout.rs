//! Chronological train/test splitting.

use std::ops::Range;

use tracing::debug;

use crate::error::RfError;

/// Split `n_samples` chronologically ordered rows into a training prefix
/// and a test suffix.
///
/// The training prefix holds `floor(n_samples * fraction)` rows; the test
/// suffix holds the remainder. Rows are never reordered, so every training
/// row precedes every test row in time.
///
/// # Errors
///
/// | Variant                            | When                                        |
/// |------------------------------------|---------------------------------------------|
/// | [`RfError::InvalidSplitFraction`]  | `fraction` outside (0.0, 1.0)               |
/// | [`RfError::TooFewSamplesForSplit`] | either partition would be empty (needs n≥2) |
pub fn chronological_split(
    n_samples: usize,
    fraction: f64,
) -> Result<(Range<usize>, Range<usize>), RfError> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(RfError::InvalidSplitFraction { fraction });
    }

    let n_train = (n_samples as f64 * fraction).floor() as usize;

    if n_train == 0 || n_train == n_samples {
        return Err(RfError::TooFewSamplesForSplit { n_samples, fraction });
    }

    debug!(n_samples, n_train, n_test = n_samples - n_train, "chronological split");

    Ok((0..n_train, n_train..n_samples))
}
