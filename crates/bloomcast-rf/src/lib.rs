//! Random Forest regression for bloom forecasting.
//!
//! Trains ensembles of variance-reducing regression trees over environmental
//! feature vectors, with chronological holdout splitting, rolling-origin
//! cross-validated hyperparameter search, and mean-decrease-in-impurity
//! feature importances. Training is deterministic for a given seed regardless
//! of thread count.
//!
//! The typical flow:
//!
//! 1. [`chronological_split`] the dataset into a training prefix and test
//!    suffix.
//! 2. [`GridSearch::search`] over a [`HyperGrid`], scored by [`RollingOrigin`]
//!    cross-validation on the training prefix.
//! 3. Predict both partitions with the refit winner and inspect
//!    [`RankedFeature`] importances.

pub mod config;
pub mod error;
pub mod folds;
pub mod forest;
pub mod grid;
pub mod holdout;
pub mod importance;
pub mod metrics;
pub mod node;
pub mod predict;
pub mod result;
pub mod serialize;
mod split;
pub mod tree;
pub mod tuner;

pub use config::{MaxFeatures, RandomForestConfig};
pub use error::RfError;
pub use folds::{Fold, RollingOrigin};
pub use forest::RandomForest;
pub use grid::{CandidateParams, HyperGrid};
pub use holdout::chronological_split;
pub use importance::RankedFeature;
pub use metrics::{mean_squared_error, r_squared, root_mean_squared_error};
pub use result::{RandomForestResult, TrainingMetadata};
pub use tree::{RegressionTree, RegressionTreeConfig};
pub use tuner::{CandidateScore, GridSearch, GridSearchResult};
