//! Hyperparameter search with experiment tracking
//!
//! Records every trial as a run, uploads the trial log and the
//! optimization-history plot as artifacts of a final run, and registers
//! the best model as a new version.

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};
use stroke_lib::tracking::TrackingStore;
use stroke_lib::trainer::{self, SearchConfig, TrialRecord};
use stroke_lib::{dataset, preprocess, Error};
use tracing::{info, warn};

#[derive(Args)]
pub struct TuneArgs {
    /// Path to the raw stroke dataset
    #[arg(long, default_value = "data/healthcare-dataset-stroke-data.csv")]
    pub data: PathBuf,

    /// Number of search trials
    #[arg(long, default_value_t = 10)]
    pub trials: usize,

    /// Tracking store location
    #[arg(long, env = "STROKE_TRACKING_URI", default_value = "db/store.db")]
    pub tracking_uri: PathBuf,

    /// Experiment the trial runs are recorded under
    #[arg(long, default_value = "stroke-tuning")]
    pub experiment: String,

    /// Registry name the best model is versioned under
    #[arg(long, default_value = "StrokePredictor")]
    pub model_name: String,
}

pub fn run(args: TuneArgs) -> Result<()> {
    let records = dataset::load_records(&args.data)?;
    let data = preprocess::clean_and_encode(&records)?;
    info!(rows = data.len(), "Dataset preprocessed");

    let store = TrackingStore::open(&args.tracking_uri)?;
    let experiment_id = match store.create_experiment(&args.experiment) {
        Ok(id) => id,
        Err(Error::ExperimentAlreadyExists(name)) => {
            warn!(experiment = %name, "Experiment already exists");
            store
                .experiment_id(&name)?
                .ok_or_else(|| Error::tracking(format!("experiment `{name}` not found")))?
        }
        Err(e) => return Err(e.into()),
    };

    let config = SearchConfig {
        n_trials: args.trials,
        ..Default::default()
    };
    let outcome = trainer::run_search(&data, &config, |trial| {
        if let Err(e) = record_trial(&store, experiment_id, trial) {
            warn!(trial = trial.number, error = %e, "Failed to record trial");
        }
    })?;

    let best = &outcome.trials[outcome.best_trial];
    info!(
        best_trial = best.number,
        mean_accuracy = best.mean_accuracy,
        max_depth = best.max_depth,
        n_trees = best.n_trees,
        "Search finished"
    );

    let run_id = store.start_run(experiment_id, Some("final-results"))?;
    store.log_param(run_id, "max_depth", &best.max_depth.to_string())?;
    store.log_param(run_id, "n_trees", &best.n_trees.to_string())?;
    store.log_metric(run_id, "best_accuracy", best.mean_accuracy)?;

    let scratch = tempfile::tempdir()?;
    let results_path = scratch.path().join("results.csv");
    write_trial_log(&outcome.trials, &results_path)?;
    let history_path = scratch.path().join("optimization_history.svg");
    trainer::render_history(&outcome.trials, &history_path)?;
    store.log_artifact(run_id, &results_path)?;
    store.log_artifact(run_id, &history_path)?;

    match store.create_registered_model(&args.model_name) {
        Ok(()) => {}
        Err(e) if e.is_already_exists() => {
            warn!(model = %args.model_name, "Model already registered")
        }
        Err(e) => return Err(e.into()),
    }
    let version =
        store.create_model_version(&args.model_name, &outcome.best.to_bytes()?, Some(run_id))?;
    info!(
        model = %args.model_name,
        version = version.version,
        accuracy = outcome.best.meta.accuracy,
        "Registered best model"
    );

    Ok(())
}

fn record_trial(
    store: &TrackingStore,
    experiment_id: i64,
    trial: &TrialRecord,
) -> stroke_lib::Result<()> {
    let run_id = store.start_run(experiment_id, Some(&format!("trial-{}", trial.number)))?;
    store.log_param(run_id, "classifier", "RandomForestClassifier")?;
    store.log_param(run_id, "max_depth", &trial.max_depth.to_string())?;
    store.log_param(run_id, "n_trees", &trial.n_trees.to_string())?;
    store.log_metric(run_id, "mean_accuracy", trial.mean_accuracy)?;
    Ok(())
}

fn write_trial_log(trials: &[TrialRecord], path: &Path) -> stroke_lib::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for trial in trials {
        writer.serialize(trial)?;
    }
    writer.flush()?;
    Ok(())
}
