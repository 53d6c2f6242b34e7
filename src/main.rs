use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use bloomcast_io::{
    CandidateSummary, ExperimentName, FoldSummary, ObservationReader, ParamSet, Partition,
    PartitionMetrics, ResultWriter, TuningReport,
};
use bloomcast_rf::{
    GridSearch, HyperGrid, RandomForest, RollingOrigin, chronological_split, mean_squared_error,
    r_squared, root_mean_squared_error,
};

#[derive(Parser)]
#[command(name = "bloomcast")]
#[command(about = "Cyanobacteria bloom forecasting with tuned Random Forest regression")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Input column-name overrides.
#[derive(Args, Debug, Clone)]
struct ColumnArgs {
    /// Name of the timestamp column
    #[arg(long, default_value = "date")]
    timestamp_column: String,

    /// Name of the site-label column
    #[arg(long, default_value = "site")]
    site_column: String,

    /// Name of the numeric target column
    #[arg(long, default_value = "cyanobacteria")]
    target_column: String,
}

/// Hyperparameter grid: one comma-separated candidate list per dimension.
#[derive(Args, Debug, Clone)]
struct GridArgs {
    /// Tree-count candidates
    #[arg(long, value_delimiter = ',', default_values_t = [200, 400])]
    grid_trees: Vec<usize>,

    /// Max-depth candidates (0 = unlimited)
    #[arg(long, value_delimiter = ',', default_values_t = [4, 8, 16])]
    grid_max_depth: Vec<usize>,

    /// Min-samples-split candidates
    #[arg(long, value_delimiter = ',', default_values_t = [2, 5])]
    grid_min_samples_split: Vec<usize>,

    /// Min-samples-leaf candidates
    #[arg(long, value_delimiter = ',', default_values_t = [1, 2])]
    grid_min_samples_leaf: Vec<usize>,

    /// Feature-subsampling fraction candidates, each in (0.0, 1.0]
    #[arg(long, value_delimiter = ',', default_values_t = [0.33, 1.0])]
    grid_max_features: Vec<f64>,

    /// Bootstrap-flag candidates
    #[arg(long, value_delimiter = ',', default_values_t = [true])]
    grid_bootstrap: Vec<bool>,
}

impl GridArgs {
    fn to_grid(&self) -> HyperGrid {
        // CLI encodes "unlimited depth" as 0.
        let max_depth: Vec<Option<usize>> = self
            .grid_max_depth
            .iter()
            .map(|&d| if d == 0 { None } else { Some(d) })
            .collect();
        HyperGrid::new()
            .with_n_trees(self.grid_trees.clone())
            .with_max_depth(max_depth)
            .with_min_samples_split(self.grid_min_samples_split.clone())
            .with_min_samples_leaf(self.grid_min_samples_leaf.clone())
            .with_max_features(self.grid_max_features.clone())
            .with_bootstrap(self.grid_bootstrap.clone())
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run the full tuning pipeline: split, grid search, refit, evaluate, export
    Tune {
        /// Path to the observation CSV file (rows in chronological order)
        #[arg(long)]
        data: PathBuf,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Fraction of rows in the chronological training prefix
        #[arg(long, default_value_t = 0.7)]
        split_fraction: f64,

        /// Number of rolling-origin cross-validation folds
        #[arg(long, default_value_t = 3)]
        cv_folds: usize,

        #[command(flatten)]
        columns: ColumnArgs,

        #[command(flatten)]
        grid: GridArgs,
    },

    /// Predict targets for an observation CSV with a saved model
    Predict {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Path to the observation CSV file
        #[arg(long)]
        data: PathBuf,

        /// Experiment name for output files
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        columns: ColumnArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TuneOutput {
    experiment: String,
    n_samples: usize,
    n_train: usize,
    n_test: usize,
    n_features: usize,
    n_candidates: usize,
    n_folds: usize,
    best_params: ParamSet,
    best_cv_score: f64,
    train_rmse: f64,
    test_rmse: f64,
    test_r_squared: f64,
    top_feature: String,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    n_samples: usize,
    model_n_trees: usize,
    model_n_features: usize,
    mse: f64,
    rmse: f64,
    r_squared: f64,
}

fn build_reader(data: &PathBuf, columns: &ColumnArgs) -> ObservationReader {
    ObservationReader::new(data)
        .with_timestamp_column(&columns.timestamp_column)
        .with_site_column(&columns.site_column)
        .with_target_column(&columns.target_column)
}

fn partition_metrics(actual: &[f64], predicted: &[f64]) -> Result<PartitionMetrics> {
    Ok(PartitionMetrics {
        n_samples: actual.len(),
        mse: mean_squared_error(actual, predicted)?,
        rmse: root_mean_squared_error(actual, predicted)?,
        r_squared: r_squared(actual, predicted)?,
    })
}

fn to_param_set(params: &bloomcast_rf::CandidateParams) -> ParamSet {
    ParamSet {
        n_trees: params.n_trees,
        max_depth: params.max_depth,
        min_samples_split: params.min_samples_split,
        min_samples_leaf: params.min_samples_leaf,
        max_features: params.max_features,
        bootstrap: params.bootstrap,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Tune {
            data,
            experiment,
            output_dir,
            split_fraction,
            cv_folds,
            columns,
            grid,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            // 1. Read observations
            let observations = build_reader(&data, &columns)
                .read()
                .context("failed to read observation CSV")?;
            info!(
                n_samples = observations.n_samples(),
                n_features = observations.n_features(),
                "observations loaded"
            );

            // 2. Chronological holdout split
            let (train_range, test_range) =
                chronological_split(observations.n_samples(), split_fraction)?;
            let (train_features, train_targets) = observations.rows(train_range.clone());
            let (test_features, test_targets) = observations.rows(test_range.clone());
            info!(
                n_train = train_range.len(),
                n_test = test_range.len(),
                "chronological split"
            );

            // 3. Grid search on the training prefix
            let hyper_grid = grid.to_grid();
            let n_candidates = hyper_grid.n_candidates();
            let search = GridSearch::new(RollingOrigin::new(cv_folds)?).with_seed(cli.seed);
            let result = search.search(
                &hyper_grid,
                train_features,
                train_targets,
                observations.feature_names(),
            )?;
            info!(
                best_score = result.best_score,
                n_trees = result.best_params.n_trees,
                "grid search complete"
            );

            // 4. Predict both partitions with the refit winner
            let forest = result.refit.forest();
            let train_predicted = forest.predict_batch(train_features)?;
            let test_predicted = forest.predict_batch(test_features)?;

            let train_metrics = partition_metrics(train_targets, &train_predicted)?;
            let test_metrics = partition_metrics(test_targets, &test_predicted)?;
            info!(
                train_rmse = train_metrics.rmse,
                test_rmse = test_metrics.rmse,
                "holdout evaluation complete"
            );

            // 5. Export artifacts
            let writer = ResultWriter::new(&output_dir, experiment_name)?;

            let importance_names: Vec<String> = result
                .refit
                .importances()
                .iter()
                .map(|f| f.name.clone())
                .collect();
            let importance_values: Vec<f64> = result
                .refit
                .importances()
                .iter()
                .map(|f| f.importance)
                .collect();
            writer.write_importances(&importance_names, &importance_values)?;
            writer.write_predictions(Partition::Train, train_targets, &train_predicted)?;
            writer.write_predictions(Partition::Test, test_targets, &test_predicted)?;

            let report = TuningReport {
                best_params: to_param_set(&result.best_params),
                best_score: result.best_score,
                n_folds: cv_folds,
                folds: result
                    .folds
                    .iter()
                    .map(|f| FoldSummary {
                        train_len: f.train.len(),
                        validation_len: f.validation.len(),
                    })
                    .collect(),
                candidates: result
                    .candidate_scores
                    .iter()
                    .map(|c| CandidateSummary {
                        params: to_param_set(&c.params),
                        mean_score: c.mean_score,
                    })
                    .collect(),
                train: train_metrics.clone(),
                test: test_metrics.clone(),
            };
            writer.write_tuning(&report)?;

            forest
                .save(writer.model_path())
                .context("failed to save model")?;
            info!(path = %writer.model_path().display(), "model saved");

            // 6. Print summary
            let output = TuneOutput {
                experiment,
                n_samples: observations.n_samples(),
                n_train: train_range.len(),
                n_test: test_range.len(),
                n_features: observations.n_features(),
                n_candidates,
                n_folds: cv_folds,
                best_params: to_param_set(&result.best_params),
                best_cv_score: result.best_score,
                train_rmse: train_metrics.rmse,
                test_rmse: test_metrics.rmse,
                test_r_squared: test_metrics.r_squared,
                top_feature: importance_names.first().cloned().unwrap_or_default(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict {
            model,
            data,
            experiment,
            output_dir,
            columns,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            // 1. Load model
            let forest = RandomForest::load(&model).context("failed to load model")?;
            info!(
                n_trees = forest.n_trees(),
                n_features = forest.n_features(),
                "model loaded"
            );

            // 2. Read observations
            let observations = build_reader(&data, &columns)
                .read()
                .context("failed to read observation CSV")?;
            info!(n_samples = observations.n_samples(), "observations loaded");

            if observations.feature_names() != forest.feature_names() {
                anyhow::bail!(
                    "feature columns {:?} do not match the model's {:?}",
                    observations.feature_names(),
                    forest.feature_names()
                );
            }

            // 3. Predict
            let predicted = forest
                .predict_batch(observations.features())
                .context("prediction failed")?;

            // 4. Write predictions CSV
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            writer.write_predictions(Partition::Full, observations.targets(), &predicted)?;

            // 5. Print summary
            let output = PredictOutput {
                experiment,
                n_samples: observations.n_samples(),
                model_n_trees: forest.n_trees(),
                model_n_features: forest.n_features(),
                mse: mean_squared_error(observations.targets(), &predicted)?,
                rmse: root_mean_squared_error(observations.targets(), &predicted)?,
                r_squared: r_squared(observations.targets(), &predicted)?,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
