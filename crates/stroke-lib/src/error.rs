//! Error types for the stroke predictor

use thiserror::Error;

/// Top-level error type shared by training, tracking and serving paths.
#[derive(Debug, Error)]
pub enum Error {
    /// A request or dataset field failed validation. Always names the field.
    #[error("schema violation on field `{field}`: {reason}")]
    SchemaViolation { field: String, reason: String },

    /// No model artifact could be resolved at load time.
    #[error("no model available: {0}")]
    ModelUnavailable(String),

    /// Idempotent setup conflict from the tracking store. Callers that
    /// re-run setup catch this, log it and continue.
    #[error("experiment `{0}` already exists")]
    ExperimentAlreadyExists(String),

    /// Idempotent registry conflict, same handling as experiments.
    #[error("model `{0}` is already registered")]
    ModelAlreadyRegistered(String),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("training error: {0}")]
    Training(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("tracking error: {0}")]
    Tracking(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("tracking store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model codec error: {0}")]
    Codec(#[from] bincode::Error),
}

impl Error {
    pub fn schema_violation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaViolation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    pub fn training(msg: impl Into<String>) -> Self {
        Self::Training(msg.into())
    }

    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    pub fn tracking(msg: impl Into<String>) -> Self {
        Self::Tracking(msg.into())
    }

    /// True for the two idempotency conflicts that setup paths suppress.
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            Self::ExperimentAlreadyExists(_) | Self::ModelAlreadyRegistered(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
