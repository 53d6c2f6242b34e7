//! Prediction methods for the Random Forest regression ensemble.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::RfError;
use crate::forest::RandomForest;

impl RandomForest {
    /// Predict the target value for a single sample.
    ///
    /// Returns the mean of the per-tree predictions.
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

        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.predict(sample)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    /// Predict target values for a batch of samples in parallel.
    ///
    /// Output order matches input order.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, RfError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the feature names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

#[cfg(test)]
mod tests {
    use crate::config::RandomForestConfig;

    fn make_linear_data() -> (Vec<Vec<f64>>, Vec<f64>, Vec<String>) {
        let features: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64, (i * 2) as f64]).collect();
        let targets: Vec<f64> = (0..40).map(|i| 3.0 * i as f64 + 1.0).collect();
        let names = vec!["a".to_string(), "b".to_string()];
        (features, targets, names)
    }

    #[test]
    fn batch_matches_individual() {
        let (features, targets, names) = make_linear_data();
        let config = RandomForestConfig::new(10).unwrap().with_seed(42);
        let result = config.fit(&features, &targets, &names).unwrap();
        let forest = result.forest();

        let batch = forest.predict_batch(&features).unwrap();
        for (i, sample) in features.iter().enumerate() {
            let single = forest.predict(sample).unwrap();
            assert_eq!(batch[i].to_bits(), single.to_bits());
        }
    }

    #[test]
    fn batch_preserves_input_order() {
        let (features, targets, names) = make_linear_data();
        let config = RandomForestConfig::new(10).unwrap().with_seed(42);
        let result = config.fit(&features, &targets, &names).unwrap();
        let forest = result.forest();

        // Predictions should roughly track the increasing targets, which
        // only holds when output order matches input order.
        let preds = forest.predict_batch(&features).unwrap();
        assert!(preds[0] < preds[39]);
    }

    #[test]
    fn accessors() {
        let (features, targets, names) = make_linear_data();
        let config = RandomForestConfig::new(7).unwrap().with_seed(42);
        let forest = config.fit(&features, &targets, &names).unwrap().into_forest();
        assert_eq!(forest.n_trees(), 7);
        assert_eq!(forest.n_features(), 2);
        assert_eq!(forest.feature_names(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn mismatched_sample_rejected() {
        let (features, targets, names) = make_linear_data();
        let config = RandomForestConfig::new(5).unwrap().with_seed(42);
        let forest = config.fit(&features, &targets, &names).unwrap().into_forest();
        let err = forest.predict(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            crate::RfError::PredictionFeatureMismatch { expected: 2, got: 1 }
        ));
    }
}
