//! Domain types for bloomcast-io.

use std::ops::Range;

use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A chronologically ordered set of site observations.
///
/// Produced by [`ObservationReader`](crate::ObservationReader). Timestamps,
/// site labels, feature rows, and targets are stored in parallel vectors —
/// row `i` of each corresponds to the same observation. Row order is the file
/// order, which is the chronological order; timestamps are kept as raw
/// strings and never parsed.
#[derive(Debug)]
pub struct ObservationSet {
    timestamps: Vec<String>,
    sites: Vec<String>,
    feature_names: Vec<String>,
    features: Vec<Vec<f64>>,
    targets: Vec<f64>,
}

impl ObservationSet {
    /// Create a new observation set.
    pub(crate) fn new(
        timestamps: Vec<String>,
        sites: Vec<String>,
        feature_names: Vec<String>,
        features: Vec<Vec<f64>>,
        targets: Vec<f64>,
    ) -> Self {
        Self {
            timestamps,
            sites,
            feature_names,
            features,
            targets,
        }
    }

    /// Return the raw timestamp strings in row order.
    #[must_use]
    pub fn timestamps(&self) -> &[String] {
        &self.timestamps
    }

    /// Return the site labels in row order.
    #[must_use]
    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    /// Return the feature column names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the feature matrix (row-major).
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Return the target values in row order.
    #[must_use]
    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// Return the number of observations.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.targets.len()
    }

    /// Return the number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Return the feature rows and targets for a contiguous row range.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    #[must_use]
    pub fn rows(&self, range: Range<usize>) -> (&[Vec<f64>], &[f64]) {
        (&self.features[range.clone()], &self.targets[range])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experiment_name_valid() {
        let name = ExperimentName::new("bloom-run_01".to_string());
        assert!(name.is_ok());
        assert_eq!(name.unwrap().as_str(), "bloom-run_01");
    }

    #[test]
    fn experiment_name_rejects_empty() {
        let name = ExperimentName::new(String::new());
        assert!(matches!(name, Err(IoError::InvalidExperimentName { .. })));
    }

    #[test]
    fn experiment_name_rejects_special_chars() {
        let name = ExperimentName::new("my experiment!".to_string());
        assert!(matches!(name, Err(IoError::InvalidExperimentName { .. })));
    }

    #[test]
    fn rows_slices_features_and_targets_together() {
        let set = ObservationSet::new(
            vec!["2020-01".into(), "2020-02".into(), "2020-03".into()],
            vec!["A".into(), "A".into(), "A".into()],
            vec!["x".into()],
            vec![vec![1.0], vec![2.0], vec![3.0]],
            vec![10.0, 20.0, 30.0],
        );
        let (features, targets) = set.rows(1..3);
        assert_eq!(features, &[vec![2.0], vec![3.0]]);
        assert_eq!(targets, &[20.0, 30.0]);
        assert_eq!(set.n_samples(), 3);
        assert_eq!(set.n_features(), 1);
    }
}
