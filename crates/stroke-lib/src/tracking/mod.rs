//! Experiment tracking and model registry

mod store;

pub use store::{sha256_hex, ModelVersion, RunId, TrackingStore};
