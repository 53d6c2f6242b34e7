use rand::Rng;

use crate::node::{FeatureIndex, Variance};

/// Sum of squared errors around the mean for a block of target values,
/// given the count, sum, and sum of squares.
///
/// Returns 0.0 for an empty block. Clamped at zero to absorb the small
/// negative values the two-pass formula can produce for constant targets.
fn sse(n: usize, sum: f64, sum_sq: f64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    (sum_sq - sum * sum / n as f64).max(0.0)
}

/// Target variance for a set of samples identified by `sample_indices`.
pub(crate) fn target_variance(targets: &[f64], sample_indices: &[usize]) -> Variance {
    let n = sample_indices.len();
    if n == 0 {
        return Variance::new(0.0);
    }
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for &si in sample_indices {
        sum += targets[si];
        sum_sq += targets[si] * targets[si];
    }
    Variance::new(sse(n, sum, sum_sq) / n as f64)
}

/// Result of finding the best split for a node.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    /// Feature used for the split.
    pub(crate) feature: FeatureIndex,
    /// Threshold value.
    pub(crate) threshold: f64,
    /// Sum-of-squared-error reduction from this split.
    pub(crate) impurity_decrease: f64,
    /// Sample indices going to the left child.
    pub(crate) left_indices: Vec<usize>,
    /// Sample indices going to the right child.
    pub(crate) right_indices: Vec<usize>,
    /// Number of samples in left child.
    pub(crate) n_left: usize,
    /// Number of samples in right child.
    pub(crate) n_right: usize,
}

/// Find the best variance-reducing split among a random subset of features.
///
/// For each of `max_features` randomly chosen features, sorts the
/// `(value, target)` pairs, scans left-to-right with incremental sum and
/// sum-of-squares updates, and tracks the globally best split by
/// sum-of-squared-error reduction.
///
/// Returns `None` when no valid split exists (all values identical,
/// or split would violate `min_samples_leaf`).
///
/// # Column-major layout
///
/// `features` is column-major: `features[feature_idx][sample_idx]`.
/// Each inner `Vec` contains all sample values for one feature column.
/// `sample_indices` are indices into these inner Vecs.
pub(crate) fn find_best_split(
    features: &[Vec<f64>],
    targets: &[f64],
    sample_indices: &[usize],
    max_features: usize,
    min_samples_leaf: usize,
    rng: &mut impl Rng,
) -> Option<SplitResult> {
    let n_features = features.len();
    let n_samples = sample_indices.len();

    if n_samples < 2 || n_features == 0 {
        return None;
    }

    // Parent SSE from a single pass over all assigned samples.
    let mut parent_sum = 0.0;
    let mut parent_sum_sq = 0.0;
    for &si in sample_indices {
        parent_sum += targets[si];
        parent_sum_sq += targets[si] * targets[si];
    }
    let parent_sse = sse(n_samples, parent_sum, parent_sum_sq);

    // Randomly shuffle feature indices and take up to max_features.
    // Partial Fisher-Yates: shuffle only the first `max_features` positions.
    let mut feature_order: Vec<usize> = (0..n_features).collect();
    let take = max_features.min(n_features);
    for i in 0..take {
        let j = rng.gen_range(i..n_features);
        feature_order.swap(i, j);
    }
    let selected_features = &feature_order[..take];

    let mut best_decrease = f64::NEG_INFINITY;
    let mut best: Option<(FeatureIndex, f64)> = None;

    for &feat_idx in selected_features {
        let feat_col = &features[feat_idx];

        // Collect (value, target) pairs for this feature.
        let mut sorted: Vec<(f64, f64)> = sample_indices
            .iter()
            .map(|&si| (feat_col[si], targets[si]))
            .collect();
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        // Incremental scan: left grows from empty, right shrinks from full.
        let mut left_sum = 0.0;
        let mut left_sum_sq = 0.0;

        for i in 0..(n_samples - 1) {
            let (val_i, target_i) = sorted[i];

            // Move sample i from right to left.
            left_sum += target_i;
            left_sum_sq += target_i * target_i;

            let n_left = i + 1;
            let n_right = n_samples - n_left;

            // Skip if next value is identical (no valid boundary here).
            let val_next = sorted[i + 1].0;
            if val_i == val_next {
                continue;
            }

            // Enforce min_samples_leaf.
            if n_left < min_samples_leaf || n_right < min_samples_leaf {
                continue;
            }

            let left_sse = sse(n_left, left_sum, left_sum_sq);
            let right_sse = sse(n_right, parent_sum - left_sum, parent_sum_sq - left_sum_sq);

            // SSE reduction; equals the weighted-variance MDI formula since
            // SSE = n * variance.
            let decrease = parent_sse - left_sse - right_sse;

            if decrease > best_decrease {
                best_decrease = decrease;
                let threshold = (val_i + val_next) / 2.0;
                best = Some((FeatureIndex::new(feat_idx), threshold));
            }
        }
    }

    let (best_feature, threshold) = best?;

    // Partition sample_indices into left/right.
    let feat_col = &features[best_feature.index()];
    let mut left_indices = Vec::with_capacity(n_samples / 2);
    let mut right_indices = Vec::with_capacity(n_samples / 2);
    for &si in sample_indices {
        if feat_col[si] <= threshold {
            left_indices.push(si);
        } else {
            right_indices.push(si);
        }
    }
    let n_left = left_indices.len();
    let n_right = right_indices.len();

    Some(SplitResult {
        feature: best_feature,
        threshold,
        impurity_decrease: best_decrease,
        left_indices,
        right_indices,
        n_left,
        n_right,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{find_best_split, target_variance};

    #[test]
    fn variance_of_constant_targets_is_zero() {
        let targets = vec![3.0, 3.0, 3.0, 3.0];
        let indices: Vec<usize> = (0..4).collect();
        let v = target_variance(&targets, &indices);
        assert!(v.value().abs() < 1e-12);
    }

    #[test]
    fn variance_known_value() {
        // Targets 1, 3 -> mean 2, variance 1.
        let targets = vec![1.0, 3.0];
        let indices = vec![0, 1];
        let v = target_variance(&targets, &indices);
        assert!((v.value() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn step_function_finds_correct_split() {
        // Feature 0: [1.0, 2.0, 3.0, 10.0, 11.0, 12.0]
        // Targets:   [0.0, 0.1, 0.0,  5.0,  5.1,  5.0]
        let features = vec![vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]];
        let targets = vec![0.0, 0.1, 0.0, 5.0, 5.1, 5.0];
        let sample_indices: Vec<usize> = (0..6).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let result = find_best_split(&features, &targets, &sample_indices, 1, 1, &mut rng);

        let split = result.expect("should find a split");
        assert_eq!(split.feature.index(), 0);
        assert!(split.threshold > 3.0 && split.threshold < 10.0);
        assert_eq!(split.n_left, 3);
        assert_eq!(split.n_right, 3);
        assert!(split.impurity_decrease > 0.0);
    }

    #[test]
    fn constant_feature_returns_none() {
        // All values are 5.0 — no valid split
        let features = vec![vec![5.0, 5.0, 5.0, 5.0]];
        let targets = vec![0.0, 0.0, 1.0, 1.0];
        let sample_indices: Vec<usize> = (0..4).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let result = find_best_split(&features, &targets, &sample_indices, 1, 1, &mut rng);

        assert!(result.is_none());
    }

    #[test]
    fn min_samples_leaf_enforced() {
        // 2 samples, min_samples_leaf = 2 — can't split because each child
        // would have only 1 sample, violating the minimum of 2.
        let features = vec![vec![1.0, 10.0]];
        let targets = vec![0.0, 1.0];
        let sample_indices: Vec<usize> = (0..2).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let result = find_best_split(&features, &targets, &sample_indices, 1, 2, &mut rng);

        assert!(result.is_none());
    }

    #[test]
    fn single_sample_returns_none() {
        let features = vec![vec![1.0]];
        let targets = vec![2.0];
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let result = find_best_split(&features, &targets, &[0], 1, 1, &mut rng);
        assert!(result.is_none());
    }
}
