//! Cross-validated random search over forest hyperparameters

use crate::error::{Error, Result};
use crate::models::{ModelMetadata, TrainingData};
use crate::predictor::{fit_forest, Forest, ForestParams, StrokeForest};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::metrics::accuracy;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Stratified fold count used by every trial.
pub const CV_FOLDS: usize = 5;

/// Inclusive bounds of the sampled tree depth.
pub const MAX_DEPTH_RANGE: (u16, u16) = (2, 50);

/// Inclusive bounds of the sampled ensemble size.
pub const N_TREES_RANGE: (u16, u16) = (50, 1000);

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub n_trials: usize,
    pub n_folds: usize,
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_trials: 10,
            n_folds: CV_FOLDS,
            seed: 42,
        }
    }
}

/// One completed trial, as written to the results log.
#[derive(Debug, Clone, Serialize)]
pub struct TrialRecord {
    pub number: usize,
    pub max_depth: u16,
    pub n_trees: u16,
    pub mean_accuracy: f64,
    pub state: &'static str,
}

pub struct SearchOutcome {
    pub best: StrokeForest,
    pub best_trial: usize,
    pub trials: Vec<TrialRecord>,
}

/// Split indices into folds that preserve label proportions.
///
/// Indices are grouped by class and dealt round-robin, so per-class counts
/// across folds differ by at most one. Deterministic.
pub fn stratified_folds(labels: &[u32], n_folds: usize) -> Vec<Vec<usize>> {
    let mut by_class: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (index, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(index);
    }

    let mut folds = vec![Vec::new(); n_folds];
    let mut next = 0usize;
    for indices in by_class.values() {
        for &index in indices {
            folds[next % n_folds].push(index);
            next += 1;
        }
    }
    folds
}

/// Run the random search. Every trial samples fresh hyperparameters,
/// evaluates them under stratified k-fold cross-validation and, when the
/// mean accuracy improves on the best seen so far, replaces the retained
/// best model. `on_trial` fires once per completed trial so callers can
/// record it.
pub fn run_search<F>(
    data: &TrainingData,
    config: &SearchConfig,
    mut on_trial: F,
) -> Result<SearchOutcome>
where
    F: FnMut(&TrialRecord),
{
    if config.n_folds < 2 {
        return Err(Error::training("cross-validation needs at least two folds"));
    }
    if data.len() < config.n_folds {
        return Err(Error::training(format!(
            "need at least {} rows for {}-fold cross-validation, got {}",
            config.n_folds,
            config.n_folds,
            data.len()
        )));
    }

    let folds = stratified_folds(&data.labels, config.n_folds);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best: Option<(usize, f64, Forest, ForestParams)> = None;
    let mut trials = Vec::with_capacity(config.n_trials);

    for number in 0..config.n_trials {
        let params = ForestParams {
            max_depth: Some(rng.gen_range(MAX_DEPTH_RANGE.0..=MAX_DEPTH_RANGE.1)),
            n_trees: rng.gen_range(N_TREES_RANGE.0..=N_TREES_RANGE.1),
            seed: 42,
        };
        let (mean_accuracy, fold_model) = cross_validate(data, &folds, params)?;

        let improved = best
            .as_ref()
            .map_or(true, |(_, acc, _, _)| mean_accuracy > *acc);
        if improved {
            best = Some((number, mean_accuracy, fold_model, params));
        }

        let record = TrialRecord {
            number,
            max_depth: params.max_depth.unwrap_or_default(),
            n_trees: params.n_trees,
            mean_accuracy,
            state: "complete",
        };
        debug!(
            trial = number,
            max_depth = record.max_depth,
            n_trees = record.n_trees,
            mean_accuracy,
            improved,
            "Trial complete"
        );
        on_trial(&record);
        trials.push(record);
    }

    let (best_trial, best_accuracy, forest, params) =
        best.ok_or_else(|| Error::training("search ran zero trials"))?;
    info!(
        best_trial,
        best_accuracy,
        max_depth = params.max_depth.unwrap_or_default(),
        n_trees = params.n_trees,
        "Search complete"
    );

    let meta = ModelMetadata {
        accuracy: best_accuracy,
        max_depth: params.max_depth,
        n_trees: params.n_trees,
        trained_at: chrono::Utc::now().timestamp(),
    };
    Ok(SearchOutcome {
        best: StrokeForest::new(forest, meta),
        best_trial,
        trials,
    })
}

/// Mean accuracy across the folds; also returns the model fitted on the
/// final fold's training split, which is what the search retains when a
/// trial improves on the best seen.
fn cross_validate(
    data: &TrainingData,
    folds: &[Vec<usize>],
    params: ForestParams,
) -> Result<(f64, Forest)> {
    let mut scores = Vec::with_capacity(folds.len());
    let mut last_model = None;

    for test_indices in folds {
        let mut in_test = vec![false; data.len()];
        for &index in test_indices {
            in_test[index] = true;
        }

        let mut x_train = Vec::with_capacity(data.len() - test_indices.len());
        let mut y_train = Vec::with_capacity(data.len() - test_indices.len());
        let mut x_test = Vec::with_capacity(test_indices.len());
        let mut y_test = Vec::with_capacity(test_indices.len());
        for index in 0..data.len() {
            if in_test[index] {
                x_test.push(data.features[index].clone());
                y_test.push(data.labels[index]);
            } else {
                x_train.push(data.features[index].clone());
                y_train.push(data.labels[index]);
            }
        }

        let forest = fit_forest(&x_train, &y_train, params)?;
        let predicted = forest
            .predict(&DenseMatrix::from_2d_vec(&x_test))
            .map_err(|e| Error::training(e.to_string()))?;
        scores.push(accuracy(&y_test, &predicted));
        last_model = Some(forest);
    }

    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    let model = last_model.ok_or_else(|| Error::training("cross-validation had no folds"))?;
    Ok((mean, model))
}
