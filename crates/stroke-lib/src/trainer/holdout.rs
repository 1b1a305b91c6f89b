//! Plain holdout training

use crate::error::{Error, Result};
use crate::models::{ModelMetadata, TrainingData};
use crate::predictor::{Forest, ForestParams, StrokeForest};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::metrics::accuracy;
use smartcore::model_selection::train_test_split;
use tracing::info;

/// Share of rows held out for evaluation.
pub const TEST_FRACTION: f32 = 0.3;

/// Shuffle seed for the holdout split.
pub const HOLDOUT_SEED: u64 = 42;

pub struct HoldoutReport {
    pub model: StrokeForest,
    pub accuracy: f64,
}

/// Fit a forest on a shuffled 70/30 split and evaluate it on the held-out
/// rows.
pub fn train_holdout(data: &TrainingData, params: ForestParams) -> Result<HoldoutReport> {
    if data.len() < 4 {
        return Err(Error::training("too few rows for a holdout split"));
    }

    let x = DenseMatrix::from_2d_vec(&data.features);
    let (x_train, x_test, y_train, y_test) =
        train_test_split(&x, &data.labels, TEST_FRACTION, true, Some(HOLDOUT_SEED));

    let forest = Forest::fit(&x_train, &y_train, params.to_smartcore())
        .map_err(|e| Error::training(e.to_string()))?;
    let predicted = forest
        .predict(&x_test)
        .map_err(|e| Error::training(e.to_string()))?;
    let acc = accuracy(&y_test, &predicted);
    info!(accuracy = acc, n_trees = params.n_trees, "Holdout evaluation complete");

    let meta = ModelMetadata {
        accuracy: acc,
        max_depth: params.max_depth,
        n_trees: params.n_trees,
        trained_at: chrono::Utc::now().timestamp(),
    };
    Ok(HoldoutReport {
        model: StrokeForest::new(forest, meta),
        accuracy: acc,
    })
}
