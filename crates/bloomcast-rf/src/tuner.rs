//! Grid search scored by rolling-origin cross-validation.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::error::RfError;
use crate::folds::{Fold, RollingOrigin};
use crate::grid::{CandidateParams, HyperGrid};
use crate::metrics::mean_squared_error;
use crate::result::RandomForestResult;

/// Cross-validated score for one grid candidate.
#[derive(Debug, Clone)]
pub struct CandidateScore {
    /// The hyperparameter combination that was evaluated.
    pub params: CandidateParams,
    /// Negative mean squared error on each fold's validation block.
    pub fold_scores: Vec<f64>,
    /// Mean of `fold_scores`.
    pub mean_score: f64,
}

/// Result of an exhaustive grid search.
#[derive(Debug)]
pub struct GridSearchResult {
    /// Enumeration index of the winning candidate.
    pub best_index: usize,
    /// The winning hyperparameter combination.
    pub best_params: CandidateParams,
    /// Mean cross-validation score of the winner (negative MSE).
    pub best_score: f64,
    /// Scores for every candidate, in grid enumeration order.
    pub candidate_scores: Vec<CandidateScore>,
    /// The fold layout the scores were computed on.
    pub folds: Vec<Fold>,
    /// The winning configuration refit on all rows passed to `search`.
    pub refit: RandomForestResult,
}

/// Exhaustive grid search over a [`HyperGrid`], scored by rolling-origin
/// cross-validation with negative mean squared error.
///
/// Candidates are evaluated in parallel, but scores are collected
/// positionally, so the selected winner does not depend on thread count or
/// execution order. Ties are broken deterministically in favor of the
/// first-encountered candidate in grid enumeration order.
#[derive(Debug, Clone, Copy)]
pub struct GridSearch {
    folds: RollingOrigin,
    seed: u64,
}

impl GridSearch {
    /// Create a grid search validated with the given fold layout.
    #[must_use]
    pub fn new(folds: RollingOrigin) -> Self {
        Self { folds, seed: 42 }
    }

    /// Set the random seed used for every ensemble fit.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the fold layout.
    #[must_use]
    pub fn folds(&self) -> RollingOrigin {
        self.folds
    }

    /// Evaluate every grid candidate and refit the winner on all rows.
    ///
    /// For each candidate, one ensemble is fit per fold on the fold's
    /// training prefix and scored on its validation block; the candidate's
    /// score is the mean negative MSE across folds. The rows passed in are
    /// assumed to be the chronological training prefix of the dataset.
    ///
    /// # Errors
    ///
    /// | Variant                            | When                                  |
    /// |------------------------------------|---------------------------------------|
    /// | [`RfError::EmptyGridDimension`]    | a grid dimension has no candidates    |
    /// | [`RfError::TooFewSamplesForFolds`] | too few rows for the fold layout      |
    /// | Other RF errors                    | from underlying training / prediction |
    #[instrument(skip_all, fields(n_samples = features.len(), n_candidates = grid.n_candidates()))]
    pub fn search(
        &self,
        grid: &HyperGrid,
        features: &[Vec<f64>],
        targets: &[f64],
        feature_names: &[String],
    ) -> Result<GridSearchResult, RfError> {
        let candidates = grid.candidates()?;
        let folds = self.folds.plan(features.len())?;

        info!(
            n_candidates = candidates.len(),
            n_folds = folds.len(),
            total_fits = candidates.len() * folds.len(),
            "starting grid search"
        );

        let seed = self.seed;
        let candidate_scores: Vec<CandidateScore> = candidates
            .into_par_iter()
            .map(|params| evaluate_candidate(params, &folds, features, targets, feature_names, seed))
            .collect::<Result<Vec<_>, RfError>>()?;

        // Sequential selection with strictly-greater comparison: ties keep
        // the first-encountered candidate in enumeration order.
        let mut best_index = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (i, score) in candidate_scores.iter().enumerate() {
            if score.mean_score > best_score {
                best_score = score.mean_score;
                best_index = i;
            }
        }

        let best_params = candidate_scores[best_index].params.clone();
        info!(
            best_index,
            best_score,
            n_trees = best_params.n_trees,
            max_depth = ?best_params.max_depth,
            "grid search complete"
        );

        // Refit the winner on the full training prefix.
        let refit = best_params
            .to_config(self.seed)?
            .fit(features, targets, feature_names)?;

        Ok(GridSearchResult {
            best_index,
            best_params,
            best_score,
            candidate_scores,
            folds,
            refit,
        })
    }
}

/// Fit and score one candidate across all folds.
fn evaluate_candidate(
    params: CandidateParams,
    folds: &[Fold],
    features: &[Vec<f64>],
    targets: &[f64],
    feature_names: &[String],
    seed: u64,
) -> Result<CandidateScore, RfError> {
    let mut fold_scores = Vec::with_capacity(folds.len());

    for (fold_index, fold) in folds.iter().enumerate() {
        // Per-fold seed offset so folds draw distinct bootstrap samples.
        let config = params.to_config(seed.wrapping_add(fold_index as u64))?;

        let result = config.fit(
            &features[fold.train.clone()],
            &targets[fold.train.clone()],
            feature_names,
        )?;

        let predicted = result
            .forest()
            .predict_batch(&features[fold.validation.clone()])?;
        let mse = mean_squared_error(&targets[fold.validation.clone()], &predicted)?;
        fold_scores.push(-mse);
    }

    let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
    debug!(mean_score, n_trees = params.n_trees, "candidate scored");

    Ok(CandidateScore {
        params,
        fold_scores,
        mean_score,
    })
}
