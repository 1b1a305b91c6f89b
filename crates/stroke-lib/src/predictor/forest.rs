//! Random-forest classifier wrapper
//!
//! Thin layer over the smartcore estimator: hyperparameters, fitting,
//! single-row prediction and the bincode artifact codec.

use crate::error::{Error, Result};
use crate::models::ModelMetadata;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

/// Concrete estimator type used throughout the crate.
pub type Forest = RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>;

/// Hyperparameters exposed by the trainers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ForestParams {
    pub max_depth: Option<u16>,
    pub n_trees: u16,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            n_trees: 100,
            seed: 42,
        }
    }
}

impl ForestParams {
    pub fn to_smartcore(self) -> RandomForestClassifierParameters {
        let mut params = RandomForestClassifierParameters::default()
            .with_n_trees(self.n_trees)
            .with_seed(self.seed);
        if let Some(depth) = self.max_depth {
            params = params.with_max_depth(depth);
        }
        params
    }
}

/// Fit a forest on a feature matrix and label vector.
pub fn fit_forest(features: &[Vec<f64>], labels: &[u32], params: ForestParams) -> Result<Forest> {
    let x = DenseMatrix::from_2d_vec(&features.to_vec());
    let y = labels.to_vec();
    Forest::fit(&x, &y, params.to_smartcore()).map_err(|e| Error::training(e.to_string()))
}

/// A fitted forest plus its metadata: the unit persisted to disk and
/// registered with the tracking store.
#[derive(Debug, Serialize, Deserialize)]
pub struct StrokeForest {
    pub meta: ModelMetadata,
    forest: Forest,
}

impl StrokeForest {
    pub fn new(forest: Forest, meta: ModelMetadata) -> Self {
        Self { meta, forest }
    }

    /// Predict the binary outcome for a single feature row.
    pub fn predict_row(&self, row: &[f64]) -> Result<u32> {
        let x = DenseMatrix::from_2d_vec(&vec![row.to_vec()]);
        let predicted = self
            .forest
            .predict(&x)
            .map_err(|e| Error::model(e.to_string()))?;
        predicted
            .first()
            .copied()
            .ok_or_else(|| Error::model("classifier returned no prediction"))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
