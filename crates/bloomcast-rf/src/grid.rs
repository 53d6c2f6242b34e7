//! Hyperparameter grid definition and enumeration.

use crate::config::{MaxFeatures, RandomForestConfig};
use crate::error::RfError;

/// A single hyperparameter combination drawn from a [`HyperGrid`].
///
/// Serializable so tuning artifacts can record exactly which configuration
/// won.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CandidateParams {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Maximum tree depth; `None` means unlimited.
    pub max_depth: Option<usize>,
    /// Minimum samples required to attempt a split.
    pub min_samples_split: usize,
    /// Minimum samples required in each leaf.
    pub min_samples_leaf: usize,
    /// Fraction of features considered at each split, in (0.0, 1.0].
    pub max_features: f64,
    /// Whether trees train on bootstrap resamples.
    pub bootstrap: bool,
}

impl CandidateParams {
    /// Build a trainable forest configuration from these parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn to_config(&self, seed: u64) -> Result<RandomForestConfig, RfError> {
        Ok(RandomForestConfig::new(self.n_trees)?
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_max_features(MaxFeatures::Fraction(self.max_features))
            .with_bootstrap(self.bootstrap)
            .with_seed(seed))
    }
}

/// An exhaustive hyperparameter grid: one candidate list per tunable
/// parameter.
///
/// Construct via [`HyperGrid::new`] for the default search space, then
/// override individual dimensions with `with_*` methods. The total number
/// of combinations is the product of the list lengths.
///
/// # Defaults
///
/// | Dimension           | Candidates           |
/// |---------------------|----------------------|
/// | `n_trees`           | 200, 400             |
/// | `max_depth`         | 4, 8, 16             |
/// | `min_samples_split` | 2, 5                 |
/// | `min_samples_leaf`  | 1, 2                 |
/// | `max_features`      | 0.33, 1.0            |
/// | `bootstrap`         | true                 |
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HyperGrid {
    n_trees: Vec<usize>,
    max_depth: Vec<Option<usize>>,
    min_samples_split: Vec<usize>,
    min_samples_leaf: Vec<usize>,
    max_features: Vec<f64>,
    bootstrap: Vec<bool>,
}

impl HyperGrid {
    /// Create the default search space.
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_trees: vec![200, 400],
            max_depth: vec![Some(4), Some(8), Some(16)],
            min_samples_split: vec![2, 5],
            min_samples_leaf: vec![1, 2],
            max_features: vec![0.33, 1.0],
            bootstrap: vec![true],
        }
    }

    /// Replace the tree-count candidates.
    #[must_use]
    pub fn with_n_trees(mut self, n_trees: Vec<usize>) -> Self {
        self.n_trees = n_trees;
        self
    }

    /// Replace the max-depth candidates (`None` = unlimited).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Vec<Option<usize>>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Replace the min-samples-split candidates.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: Vec<usize>) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Replace the min-samples-leaf candidates.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: Vec<usize>) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Replace the feature-subsampling fraction candidates.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Vec<f64>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Replace the bootstrap-flag candidates.
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: Vec<bool>) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Return the total number of candidate configurations.
    #[must_use]
    pub fn n_candidates(&self) -> usize {
        self.n_trees.len()
            * self.max_depth.len()
            * self.min_samples_split.len()
            * self.min_samples_leaf.len()
            * self.max_features.len()
            * self.bootstrap.len()
    }

    /// Enumerate every candidate in a fixed nested order: `n_trees`
    /// outermost, `bootstrap` innermost.
    ///
    /// The order is part of the contract — grid-search tie-breaking selects
    /// the first-encountered candidate.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::EmptyGridDimension`] naming the first dimension
    /// with no candidate values.
    pub fn candidates(&self) -> Result<Vec<CandidateParams>, RfError> {
        self.validate()?;

        let mut out = Vec::with_capacity(self.n_candidates());
        for &n_trees in &self.n_trees {
            for &max_depth in &self.max_depth {
                for &min_samples_split in &self.min_samples_split {
                    for &min_samples_leaf in &self.min_samples_leaf {
                        for &max_features in &self.max_features {
                            for &bootstrap in &self.bootstrap {
                                out.push(CandidateParams {
                                    n_trees,
                                    max_depth,
                                    min_samples_split,
                                    min_samples_leaf,
                                    max_features,
                                    bootstrap,
                                });
                            }
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    fn validate(&self) -> Result<(), RfError> {
        let dims: [(&'static str, bool); 6] = [
            ("n_trees", self.n_trees.is_empty()),
            ("max_depth", self.max_depth.is_empty()),
            ("min_samples_split", self.min_samples_split.is_empty()),
            ("min_samples_leaf", self.min_samples_leaf.is_empty()),
            ("max_features", self.max_features.is_empty()),
            ("bootstrap", self.bootstrap.is_empty()),
        ];
        for (parameter, empty) in dims {
            if empty {
                return Err(RfError::EmptyGridDimension { parameter });
            }
        }
        Ok(())
    }
}

impl Default for HyperGrid {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::HyperGrid;
    use crate::RfError;

    #[test]
    fn default_grid_has_48_candidates() {
        // Candidate-list sizes [2, 3, 2, 2, 2, 1] -> 48 combinations.
        let grid = HyperGrid::new();
        assert_eq!(grid.n_candidates(), 48);
        assert_eq!(grid.candidates().unwrap().len(), 48);
    }

    #[test]
    fn enumeration_order_is_stable() {
        let grid = HyperGrid::new()
            .with_n_trees(vec![10, 20])
            .with_max_depth(vec![Some(2)])
            .with_min_samples_split(vec![2])
            .with_min_samples_leaf(vec![1])
            .with_max_features(vec![0.5, 1.0])
            .with_bootstrap(vec![true]);

        let candidates = grid.candidates().unwrap();
        assert_eq!(candidates.len(), 4);
        // n_trees varies slowest, max_features faster.
        assert_eq!(candidates[0].n_trees, 10);
        assert!((candidates[0].max_features - 0.5).abs() < 1e-12);
        assert_eq!(candidates[1].n_trees, 10);
        assert!((candidates[1].max_features - 1.0).abs() < 1e-12);
        assert_eq!(candidates[2].n_trees, 20);
        assert_eq!(candidates[3].n_trees, 20);
    }

    #[test]
    fn empty_dimension_rejected_by_name() {
        let grid = HyperGrid::new().with_max_depth(vec![]);
        let err = grid.candidates().unwrap_err();
        assert!(matches!(
            err,
            RfError::EmptyGridDimension { parameter: "max_depth" }
        ));
    }

    #[test]
    fn candidate_converts_to_config() {
        let grid = HyperGrid::new();
        let candidate = &grid.candidates().unwrap()[0];
        let config = candidate.to_config(7).unwrap();
        assert_eq!(config.n_trees(), candidate.n_trees);
        assert_eq!(config.seed(), 7);
        assert_eq!(config.bootstrap(), candidate.bootstrap);
    }
}
