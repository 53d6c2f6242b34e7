//! Ranking of ensemble feature importances.
//!
//! Each regression tree reports how much of its total SSE reduction each
//! feature column accounts for. The ensemble importance is the renormalized
//! sum over trees, ordered for the importance report.

/// One feature's share of the ensemble's impurity reduction.
#[derive(Debug, Clone)]
pub struct RankedFeature {
    /// Column name from the training data.
    pub name: String,
    /// Fraction of the total SSE decrease attributed to this feature.
    /// Non-negative; the shares sum to 1.0 unless every tree is a stump.
    pub importance: f64,
    /// Position in the descending ordering, starting at 1.
    pub rank: usize,
}

/// Sum the per-tree MDI vectors, renormalize, and rank descending.
///
/// Ties keep the original column order (stable sort), so the ranking is
/// deterministic for a fixed training run.
pub(crate) fn aggregate_importances(per_tree: &[Vec<f64>], names: &[String]) -> Vec<RankedFeature> {
    if per_tree.is_empty() || names.is_empty() {
        return Vec::new();
    }

    let mut shares = vec![0.0f64; names.len()];
    for tree_importances in per_tree {
        for (share, &value) in shares.iter_mut().zip(tree_importances) {
            *share += value;
        }
    }

    // Stump-only ensembles make no splits; every share stays zero.
    let total: f64 = shares.iter().sum();
    if total > 0.0 {
        for share in &mut shares {
            *share /= total;
        }
    }

    let mut order: Vec<usize> = (0..names.len()).collect();
    order.sort_by(|&a, &b| shares[b].total_cmp(&shares[a]));

    order
        .into_iter()
        .enumerate()
        .map(|(position, column)| RankedFeature {
            name: names[column].clone(),
            importance: shares[column],
            rank: position + 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::aggregate_importances;

    #[test]
    fn empty_input_empty_output() {
        assert!(aggregate_importances(&[], &[]).is_empty());
    }

    #[test]
    fn normalizes_and_ranks_descending() {
        let per_tree = vec![vec![0.2, 0.8], vec![0.4, 0.6]];
        let names = vec!["wind".to_string(), "chla".to_string()];
        let ranked = aggregate_importances(&per_tree, &names);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name, "chla");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].name, "wind");
        assert_eq!(ranked[1].rank, 2);

        let total: f64 = ranked.iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(ranked.iter().all(|f| f.importance >= 0.0));
    }

    #[test]
    fn all_zero_trees_stay_zero() {
        let per_tree = vec![vec![0.0, 0.0]];
        let names = vec!["a".to_string(), "b".to_string()];
        let ranked = aggregate_importances(&per_tree, &names);
        assert!(ranked.iter().all(|f| f.importance == 0.0));
    }

    #[test]
    fn ties_keep_column_order() {
        let per_tree = vec![vec![0.25, 0.5, 0.25]];
        let names = vec!["ph".to_string(), "temp".to_string(), "nitrate".to_string()];
        let ranked = aggregate_importances(&per_tree, &names);

        assert_eq!(ranked[0].name, "temp");
        assert_eq!(ranked[1].name, "ph");
        assert_eq!(ranked[2].name, "nitrate");
        assert_eq!(ranked[1].rank, 2);
        assert_eq!(ranked[2].rank, 3);
    }
}
