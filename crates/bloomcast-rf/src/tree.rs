use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::{
    RfError,
    node::{Node, NodeIndex},
    split::{find_best_split, target_variance},
};

/// Configuration for a single CART regression tree.
///
/// Construct via [`RegressionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `max_depth`         | `None` (unlimited)    |
/// | `min_samples_split` | 2                     |
/// | `min_samples_leaf`  | 1                     |
/// | `max_features`      | `None` (all features) |
/// | `seed`              | 42                    |
#[derive(Debug, Clone)]
pub struct RegressionTreeConfig {
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: u64,
}

impl RegressionTreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }

    /// Set the maximum tree depth.
    ///
    /// `None` means grow until all leaves have constant targets or stopping
    /// conditions are met. `Some(d)` limits depth to `d` levels (root is depth 0).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of samples required in each leaf after a split.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the maximum number of features to consider at each split.
    ///
    /// `None` means consider all features.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the maximum depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the minimum samples required to split a node.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Return the minimum samples required in each leaf.
    #[must_use]
    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    /// Return the maximum features to consider per split, if set.
    #[must_use]
    pub fn max_features(&self) -> Option<usize> {
        self.max_features
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train a regression tree on the provided row-major dataset.
    ///
    /// `features[sample_idx][feature_idx]` — row-major layout.
    /// `targets[sample_idx]` — continuous target values.
    ///
    /// # Errors
    ///
    /// | Variant                            | When                                            |
    /// |------------------------------------|-------------------------------------------------|
    /// | [`RfError::EmptyDataset`]          | `features` is empty                             |
    /// | [`RfError::ZeroFeatures`]          | rows have zero feature columns                  |
    /// | [`RfError::FeatureCountMismatch`]  | rows have inconsistent lengths                  |
    /// | [`RfError::TargetCountMismatch`]   | `targets.len() != features.len()`               |
    /// | [`RfError::NonFiniteValue`]        | any feature value is NaN or infinite            |
    /// | [`RfError::NonFiniteTarget`]       | any target value is NaN or infinite             |
    /// | [`RfError::InvalidMaxFeatures`]    | `max_features` resolves outside [1, n_features] |
    /// | [`RfError::InvalidMaxDepth`]       | `max_depth` is `Some(0)`                        |
    /// | [`RfError::InvalidMinSamplesSplit`]| `min_samples_split` < 2                         |
    /// | [`RfError::InvalidMinSamplesLeaf`] | `min_samples_leaf` < 1                          |
    #[instrument(skip(self, features, targets), fields(n_samples = features.len()))]
    pub fn fit(&self, features: &[Vec<f64>], targets: &[f64]) -> Result<RegressionTree, RfError> {
        // --- Validate inputs ---
        if features.is_empty() {
            return Err(RfError::EmptyDataset);
        }

        let n_samples = features.len();
        let n_features = features[0].len();

        if n_features == 0 {
            return Err(RfError::ZeroFeatures);
        }

        if targets.len() != n_samples {
            return Err(RfError::TargetCountMismatch {
                expected: n_samples,
                got: targets.len(),
            });
        }

        for (sample_index, row) in features.iter().enumerate() {
            if row.len() != n_features {
                return Err(RfError::FeatureCountMismatch {
                    expected: n_features,
                    got: row.len(),
                    sample_index,
                });
            }
            for (feature_index, &val) in row.iter().enumerate() {
                if !val.is_finite() {
                    return Err(RfError::NonFiniteValue {
                        sample_index,
                        feature_index,
                    });
                }
            }
        }

        for (sample_index, &t) in targets.iter().enumerate() {
            if !t.is_finite() {
                return Err(RfError::NonFiniteTarget { sample_index });
            }
        }

        // --- Validate config ---
        if let Some(d) = self.max_depth
            && d == 0
        {
            return Err(RfError::InvalidMaxDepth { max_depth: 0 });
        }

        if self.min_samples_split < 2 {
            return Err(RfError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }

        if self.min_samples_leaf < 1 {
            return Err(RfError::InvalidMinSamplesLeaf {
                min_samples_leaf: self.min_samples_leaf,
            });
        }

        let max_features = self.max_features.unwrap_or(n_features);
        if max_features == 0 || max_features > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features,
                n_features,
            });
        }

        debug!(
            n_samples = n_samples,
            n_features = n_features,
            max_features = max_features,
            "fitting regression tree"
        );

        // Convert to column-major layout for find_best_split.
        let col_features: Vec<Vec<f64>> = (0..n_features)
            .map(|feat_idx| features.iter().map(|row| row[feat_idx]).collect())
            .collect();

        let sample_indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut arena: Vec<Node> = Vec::new();

        let root = build_tree(
            &col_features,
            targets,
            &sample_indices,
            self,
            0,
            &mut rng,
            &mut arena,
            max_features,
        );

        debug!(
            root_index = root.index(),
            n_nodes = arena.len(),
            "regression tree built"
        );

        Ok(RegressionTree {
            nodes: arena,
            n_features,
        })
    }
}

impl Default for RegressionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively build the arena-based regression tree.
///
/// Returns the [`NodeIndex`] of the node just created in `arena`.
#[allow(clippy::too_many_arguments)]
fn build_tree(
    col_features: &[Vec<f64>],
    targets: &[f64],
    sample_indices: &[usize],
    config: &RegressionTreeConfig,
    depth: usize,
    rng: &mut ChaCha8Rng,
    arena: &mut Vec<Node>,
    max_features: usize,
) -> NodeIndex {
    let n_samples = sample_indices.len();
    let variance = target_variance(targets, sample_indices);

    // Leaf prediction is the mean target of the samples that reached it.
    let make_leaf = |arena: &mut Vec<Node>| -> NodeIndex {
        let sum: f64 = sample_indices.iter().map(|&si| targets[si]).sum();
        let prediction = sum / n_samples as f64;
        let idx = arena.len();
        arena.push(Node::Leaf {
            prediction,
            variance,
            n_samples,
        });
        NodeIndex::new(idx)
    };

    // Stopping conditions → leaf.
    let depth_exceeded = config.max_depth.is_some_and(|max_d| depth >= max_d);
    let too_few = n_samples < config.min_samples_split;
    let constant = variance.value() == 0.0;

    if too_few || constant || depth_exceeded {
        return make_leaf(arena);
    }

    // Try to find a split.
    let split_result = find_best_split(
        col_features,
        targets,
        sample_indices,
        max_features,
        config.min_samples_leaf,
        rng,
    );

    let split = match split_result {
        Some(s) => s,
        None => return make_leaf(arena),
    };

    // Arena pattern: reserve index, recurse, then overwrite with the split.
    let node_idx = arena.len();
    // Push a temporary placeholder so children can reference valid indices.
    arena.push(Node::Leaf {
        prediction: 0.0,
        variance,
        n_samples,
    });

    let left_idx = build_tree(
        col_features,
        targets,
        &split.left_indices,
        config,
        depth + 1,
        rng,
        arena,
        max_features,
    );

    let right_idx = build_tree(
        col_features,
        targets,
        &split.right_indices,
        config,
        depth + 1,
        rng,
        arena,
        max_features,
    );

    arena[node_idx] = Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left: left_idx,
        right: right_idx,
        variance,
        n_samples,
        impurity_decrease: split.impurity_decrease,
    };

    NodeIndex::new(node_idx)
}

/// A fitted CART regression tree.
///
/// Stored as an arena-based `Vec<Node>` with index references for
/// cache-friendly traversal and trivial serialization.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RegressionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
}

impl RegressionTree {
    /// Predict the target value for a single sample.
    ///
    /// Traverses from the root (index 0): at each `Split`, goes left when
    /// `sample[feature] <= threshold`, right otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<f64, RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let leaf = self.traverse(sample);
        match &self.nodes[leaf] {
            Node::Leaf { prediction, .. } => Ok(*prediction),
            Node::Split { .. } => unreachable!("traverse always ends at a leaf"),
        }
    }

    /// Compute Mean Decrease in Impurity (MDI) feature importances.
    ///
    /// For each `Split` node, the `impurity_decrease` is accumulated by
    /// feature index, then the totals are normalized so they sum to 1.0.
    /// Returns a `Vec` of length `n_features`; all zeros when the tree is
    /// a single leaf.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Split {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                totals[feature.index()] += impurity_decrease;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Return the total number of nodes in the tree (both splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth of the tree.
    ///
    /// A single-node tree (just a root leaf) has depth 0.
    /// Uses an iterative BFS approach.
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }

        // BFS: (node_index, current_depth)
        let mut max_depth = 0usize;
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((0usize, 0usize));

        while let Some((node_idx, d)) = queue.pop_front() {
            match &self.nodes[node_idx] {
                Node::Leaf { .. } => {
                    if d > max_depth {
                        max_depth = d;
                    }
                }
                Node::Split { left, right, .. } => {
                    queue.push_back((left.index(), d + 1));
                    queue.push_back((right.index(), d + 1));
                }
            }
        }

        max_depth
    }

    /// Traverse the tree from the root and return the arena index of the leaf.
    fn traverse(&self, sample: &[f64]) -> usize {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { .. } => return idx,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    if sample[feature.index()] <= *threshold {
                        idx = left.index();
                    } else {
                        idx = right.index();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_dataset_error() {
        let features: Vec<Vec<f64>> = vec![];
        let targets: Vec<f64> = vec![];
        let err = RegressionTreeConfig::new().fit(&features, &targets).unwrap_err();
        assert!(matches!(err, RfError::EmptyDataset));
    }

    #[test]
    fn constant_targets_single_leaf() {
        // All same target → single leaf node
        let features = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let targets = vec![7.5, 7.5, 7.5];
        let tree = RegressionTreeConfig::new().fit(&features, &targets).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.n_leaves(), 1);
        assert!((tree.predict(&[2.0, 3.0]).unwrap() - 7.5).abs() < 1e-12);
    }

    #[test]
    fn step_function_recovered() {
        // Feature 0: [1, 2, 3, 10, 11, 12], targets near 0 or near 5.
        let features = vec![
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![3.0, 0.0],
            vec![10.0, 0.0],
            vec![11.0, 0.0],
            vec![12.0, 0.0],
        ];
        let targets = vec![0.0, 0.0, 0.0, 5.0, 5.0, 5.0];
        let tree = RegressionTreeConfig::new()
            .with_seed(42)
            .fit(&features, &targets)
            .unwrap();
        assert!((tree.predict(&[2.0, 0.0]).unwrap() - 0.0).abs() < 1e-12);
        assert!((tree.predict(&[11.0, 0.0]).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn fully_grown_tree_interpolates_training_data() {
        let features = vec![
            vec![1.0],
            vec![2.0],
            vec![3.0],
            vec![4.0],
            vec![5.0],
        ];
        let targets = vec![1.5, 2.5, 3.5, 4.5, 5.5];
        let tree = RegressionTreeConfig::new()
            .with_seed(42)
            .fit(&features, &targets)
            .unwrap();
        for (row, &t) in features.iter().zip(&targets) {
            assert!((tree.predict(row).unwrap() - t).abs() < 1e-12);
        }
    }

    #[test]
    fn feature_importances_sum_to_one() {
        let features = vec![
            vec![1.0, 100.0],
            vec![2.0, 200.0],
            vec![3.0, 300.0],
            vec![10.0, 100.0],
            vec![11.0, 200.0],
            vec![12.0, 300.0],
        ];
        let targets = vec![0.0, 0.1, 0.0, 5.0, 5.1, 5.0];
        let tree = RegressionTreeConfig::new().fit(&features, &targets).unwrap();
        let importances = tree.feature_importances();
        let sum: f64 = importances.iter().sum();
        assert!((sum - 1.0).abs() < 1e-10, "sum = {sum}");
    }

    #[test]
    fn stump_importances_all_zero() {
        let features = vec![vec![1.0], vec![2.0]];
        let targets = vec![3.0, 3.0];
        let tree = RegressionTreeConfig::new().fit(&features, &targets).unwrap();
        assert!(tree.feature_importances().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn deterministic_with_same_seed() {
        let features = vec![
            vec![1.0, 5.0],
            vec![2.0, 6.0],
            vec![3.0, 7.0],
            vec![10.0, 15.0],
            vec![11.0, 16.0],
            vec![12.0, 17.0],
        ];
        let targets = vec![0.2, 0.1, 0.3, 5.2, 5.1, 5.3];
        let tree1 = RegressionTreeConfig::new()
            .with_seed(123)
            .with_max_features(Some(1))
            .fit(&features, &targets)
            .unwrap();
        let tree2 = RegressionTreeConfig::new()
            .with_seed(123)
            .with_max_features(Some(1))
            .fit(&features, &targets)
            .unwrap();
        for sample in &features {
            assert_eq!(
                tree1.predict(sample).unwrap().to_bits(),
                tree2.predict(sample).unwrap().to_bits()
            );
        }
    }

    #[test]
    fn prediction_feature_mismatch() {
        let features = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let targets = vec![0.0, 1.0];
        let tree = RegressionTreeConfig::new().fit(&features, &targets).unwrap();
        let err = tree.predict(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            RfError::PredictionFeatureMismatch { expected: 2, got: 1 }
        ));
    }

    #[test]
    fn max_depth_limits_tree() {
        let features = vec![
            vec![1.0],
            vec![2.0],
            vec![3.0],
            vec![4.0],
            vec![5.0],
            vec![6.0],
            vec![7.0],
            vec![8.0],
        ];
        let targets = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let tree = RegressionTreeConfig::new()
            .with_max_depth(Some(2))
            .with_seed(42)
            .fit(&features, &targets)
            .unwrap();
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn feature_count_mismatch_error() {
        let features = vec![vec![1.0, 2.0], vec![3.0]]; // inconsistent
        let targets = vec![0.0, 1.0];
        let err = RegressionTreeConfig::new().fit(&features, &targets).unwrap_err();
        assert!(matches!(err, RfError::FeatureCountMismatch { .. }));
    }

    #[test]
    fn target_count_mismatch_error() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0]];
        let targets = vec![0.0, 1.0];
        let err = RegressionTreeConfig::new().fit(&features, &targets).unwrap_err();
        assert!(matches!(
            err,
            RfError::TargetCountMismatch { expected: 3, got: 2 }
        ));
    }

    #[test]
    fn non_finite_value_error() {
        let features = vec![vec![1.0, f64::NAN], vec![3.0, 4.0]];
        let targets = vec![0.0, 1.0];
        let err = RegressionTreeConfig::new().fit(&features, &targets).unwrap_err();
        assert!(matches!(err, RfError::NonFiniteValue { .. }));
    }

    #[test]
    fn non_finite_target_error() {
        let features = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let targets = vec![0.0, f64::INFINITY];
        let err = RegressionTreeConfig::new().fit(&features, &targets).unwrap_err();
        assert!(matches!(err, RfError::NonFiniteTarget { sample_index: 1 }));
    }

    #[test]
    fn min_samples_split_respected() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        let targets = vec![1.0, 2.0, 3.0, 4.0];
        let tree = RegressionTreeConfig::new()
            .with_min_samples_split(5)
            .fit(&features, &targets)
            .unwrap();
        // Root has 4 samples < 5, so it must stay a leaf predicting the mean.
        assert_eq!(tree.n_nodes(), 1);
        assert!((tree.predict(&[2.5]).unwrap() - 2.5).abs() < 1e-12);
    }
}
