//! Library for the stroke prediction service
//!
//! This crate provides the core functionality for:
//! - Loading and preprocessing the tabular stroke dataset
//! - Training a random-forest classifier (plain fit or cross-validated search)
//! - Experiment tracking and a versioned model registry
//! - Loading the latest registered model for serving
//! - Health checks and observability

pub mod dataset;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod preprocess;
pub mod schema;
pub mod tracking;
pub mod trainer;

pub use error::{Error, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::ServiceMetrics;
