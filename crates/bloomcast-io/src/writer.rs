//! CSV and JSON result writer for tuning and prediction outputs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Which dataset partition a predictions file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    /// The chronological training prefix.
    Train,
    /// The chronological test suffix.
    Test,
    /// An entire observation file, outside any train/test split.
    Full,
}

impl Partition {
    /// Return the partition name used in output file names.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Train => "train",
            Partition::Test => "test",
            Partition::Full => "full",
        }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hyperparameter combination as recorded in the tuning artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ParamSet {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Maximum tree depth; `None` means unlimited.
    pub max_depth: Option<usize>,
    /// Minimum samples required to attempt a split.
    pub min_samples_split: usize,
    /// Minimum samples required in each leaf.
    pub min_samples_leaf: usize,
    /// Fraction of features considered at each split.
    pub max_features: f64,
    /// Whether trees trained on bootstrap resamples.
    pub bootstrap: bool,
}

/// One evaluated grid candidate: its parameters and mean validation score.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummary {
    /// The candidate's hyperparameters.
    pub params: ParamSet,
    /// Mean negative MSE across the cross-validation folds.
    pub mean_score: f64,
}

/// Sizes of one rolling-origin fold.
#[derive(Debug, Clone, Serialize)]
pub struct FoldSummary {
    /// Number of training rows in this fold.
    pub train_len: usize,
    /// Number of validation rows in this fold.
    pub validation_len: usize,
}

/// Holdout metrics for one partition.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionMetrics {
    /// Number of rows in the partition.
    pub n_samples: usize,
    /// Mean squared error.
    pub mse: f64,
    /// Root mean squared error.
    pub rmse: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
}

/// The full tuning report written to `{experiment}_tuning.json`.
///
/// Built from primitives only — the writer has no dependency on
/// `bloomcast-rf`.
#[derive(Debug, Serialize)]
pub struct TuningReport {
    /// The winning hyperparameters.
    pub best_params: ParamSet,
    /// The winner's mean cross-validation score (negative MSE).
    pub best_score: f64,
    /// Number of folds used for cross-validation.
    pub n_folds: usize,
    /// Fold sizes in order.
    pub folds: Vec<FoldSummary>,
    /// Every candidate and its mean score, in grid enumeration order.
    pub candidates: Vec<CandidateSummary>,
    /// Refit-model metrics on the training prefix.
    pub train: PartitionMetrics,
    /// Refit-model metrics on the test suffix.
    pub test: PartitionMetrics,
}

#[derive(Serialize)]
struct TuningArtifact<'a> {
    experiment: &'a str,
    #[serde(flatten)]
    report: &'a TuningReport,
}

#[derive(Serialize)]
struct ImportanceRow<'a> {
    feature: &'a str,
    importance: f64,
}

#[derive(Serialize)]
struct PredictionRow {
    actual: f64,
    predicted: f64,
}

/// Writes tuning and prediction results to CSV and JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_importance.csv`,
/// `{experiment}_{partition}_predictions.csv`, `{experiment}_tuning.json`,
/// and `{experiment}_model.bin`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write ranked feature importances to `{experiment}_importance.csv`.
    ///
    /// Columns are `feature,importance`; rows are written in the given
    /// order, which callers are expected to have sorted descending.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::CsvWrite`] if a record cannot be written.
    #[instrument(skip_all)]
    pub fn write_importances(
        &self,
        feature_names: &[String],
        importances: &[f64],
    ) -> Result<(), IoError> {
        let path = self
            .output_dir
            .join(format!("{}_importance.csv", self.experiment.as_str()));

        let mut wtr = csv::Writer::from_path(&path).map_err(|e| IoError::CsvWrite {
            path: path.clone(),
            source: e,
        })?;
        for (name, &importance) in feature_names.iter().zip(importances) {
            wtr.serialize(ImportanceRow {
                feature: name.as_str(),
                importance,
            })
            .map_err(|e| IoError::CsvWrite {
                path: path.clone(),
                source: e,
            })?;
        }
        wtr.flush().map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), n_features = feature_names.len(), "importances written");
        Ok(())
    }

    /// Write actual/predicted pairs to `{experiment}_{partition}_predictions.csv`.
    ///
    /// Columns are `actual,predicted`; rows keep the input order, which is
    /// the chronological order of the partition.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::CsvWrite`] if a record cannot be written.
    #[instrument(skip_all, fields(partition = %partition))]
    pub fn write_predictions(
        &self,
        partition: Partition,
        actual: &[f64],
        predicted: &[f64],
    ) -> Result<(), IoError> {
        let path = self.output_dir.join(format!(
            "{}_{}_predictions.csv",
            self.experiment.as_str(),
            partition.as_str()
        ));

        let mut wtr = csv::Writer::from_path(&path).map_err(|e| IoError::CsvWrite {
            path: path.clone(),
            source: e,
        })?;
        for (&a, &p) in actual.iter().zip(predicted) {
            wtr.serialize(PredictionRow {
                actual: a,
                predicted: p,
            })
            .map_err(|e| IoError::CsvWrite {
                path: path.clone(),
                source: e,
            })?;
        }
        wtr.flush().map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), n_rows = actual.len(), "predictions written");
        Ok(())
    }

    /// Write the tuning report to `{experiment}_tuning.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_tuning(&self, report: &TuningReport) -> Result<(), IoError> {
        let path = self
            .output_dir
            .join(format!("{}_tuning.json", self.experiment.as_str()));

        let artifact = TuningArtifact {
            experiment: self.experiment.as_str(),
            report,
        };

        let json = serde_json::to_string_pretty(&artifact).expect("serialization cannot fail");
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "tuning report written");
        Ok(())
    }

    /// Return the path where the model binary should be saved.
    ///
    /// Does not write anything — just computes `{output_dir}/{experiment}_model.bin`.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_model.bin", self.experiment.as_str()))
    }
}
