//! Rolling-origin (expanding-window) cross-validation folds.

use std::ops::Range;

use crate::error::RfError;

/// One cross-validation fold: a training prefix and the validation block
/// that immediately follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// Index range of the training rows (always starts at 0).
    pub train: Range<usize>,
    /// Index range of the validation rows, strictly after `train`.
    pub validation: Range<usize>,
}

/// Rolling-origin cross-validation layout for chronologically ordered data.
///
/// The index range is sliced into `n_folds + 1` contiguous blocks. Fold `i`
/// trains on blocks `0..=i` and validates on block `i + 1`, so successive
/// training sets are strict prefixes of each other and no fold ever sees
/// data from its own future.
#[derive(Debug, Clone, Copy)]
pub struct RollingOrigin {
    n_folds: usize,
}

impl RollingOrigin {
    /// Create a rolling-origin layout with the given number of folds.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidFoldCount`] if `n_folds` < 2.
    pub fn new(n_folds: usize) -> Result<Self, RfError> {
        if n_folds < 2 {
            return Err(RfError::InvalidFoldCount { n_folds });
        }
        Ok(Self { n_folds })
    }

    /// Return the number of folds.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Compute the fold layout for `n_samples` rows.
    ///
    /// Block boundaries are `floor(j * n_samples / (n_folds + 1))`, so block
    /// sizes differ by at most one and every block is non-empty whenever
    /// `n_samples >= n_folds + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::TooFewSamplesForFolds`] when
    /// `n_samples < n_folds + 1`.
    pub fn plan(&self, n_samples: usize) -> Result<Vec<Fold>, RfError> {
        let n_blocks = self.n_folds + 1;
        if n_samples < n_blocks {
            return Err(RfError::TooFewSamplesForFolds {
                n_samples,
                n_folds: self.n_folds,
            });
        }

        let boundary = |j: usize| j * n_samples / n_blocks;

        let folds = (0..self.n_folds)
            .map(|i| Fold {
                train: 0..boundary(i + 1),
                validation: boundary(i + 1)..boundary(i + 2),
            })
            .collect();

        Ok(folds)
    }
}

#[cfg(test)]
mod tests {
    use super::RollingOrigin;
    use crate::RfError;

    #[test]
    fn three_folds_on_59_rows() {
        // The 85-row / 0.7-split scenario leaves 59 training rows.
        let folds = RollingOrigin::new(3).unwrap().plan(59).unwrap();
        assert_eq!(folds.len(), 3);
        assert_eq!(folds[0].train, 0..14);
        assert_eq!(folds[0].validation, 14..29);
        assert_eq!(folds[1].train, 0..29);
        assert_eq!(folds[1].validation, 29..44);
        assert_eq!(folds[2].train, 0..44);
        assert_eq!(folds[2].validation, 44..59);
    }

    #[test]
    fn validation_follows_training_and_is_disjoint() {
        for n in 5..100 {
            let folds = RollingOrigin::new(4).unwrap().plan(n).unwrap();
            for fold in &folds {
                assert_eq!(fold.train.start, 0);
                assert_eq!(fold.validation.start, fold.train.end);
                assert!(fold.validation.end > fold.validation.start);
                assert!(fold.train.end > fold.train.start);
            }
        }
    }

    #[test]
    fn training_sizes_strictly_increase() {
        let folds = RollingOrigin::new(5).unwrap().plan(73).unwrap();
        for pair in folds.windows(2) {
            assert!(pair[1].train.len() > pair[0].train.len());
            // Each training set is a strict prefix of the next.
            assert!(pair[1].train.end > pair[0].train.end);
        }
    }

    #[test]
    fn validation_blocks_cover_suffix_without_overlap() {
        let folds = RollingOrigin::new(3).unwrap().plan(40).unwrap();
        for pair in folds.windows(2) {
            assert_eq!(pair[0].validation.end, pair[1].validation.start);
        }
        assert_eq!(folds.last().unwrap().validation.end, 40);
    }

    #[test]
    fn minimum_viable_sample_count() {
        // k + 1 rows: one row per block.
        let folds = RollingOrigin::new(3).unwrap().plan(4).unwrap();
        assert_eq!(folds.len(), 3);
        assert_eq!(folds[0].train.len(), 1);
        assert_eq!(folds[0].validation.len(), 1);
    }

    #[test]
    fn too_few_samples_rejected() {
        let err = RollingOrigin::new(3).unwrap().plan(3).unwrap_err();
        assert!(matches!(
            err,
            RfError::TooFewSamplesForFolds { n_samples: 3, n_folds: 3 }
        ));
    }

    #[test]
    fn invalid_fold_count_rejected() {
        assert!(RollingOrigin::new(0).is_err());
        assert!(RollingOrigin::new(1).is_err());
    }
}
