//! Stroke prediction service
//!
//! Serves binary stroke predictions from the latest registered model
//! behind a small HTTP API.

use anyhow::Result;
use std::sync::Arc;
use stroke_lib::health::{components, HealthRegistry};
use stroke_lib::predictor::ModelLoader;
use stroke_lib::ServiceMetrics;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(version = SERVICE_VERSION, "Starting stroke-server");

    let config = config::ServerConfig::load()?;
    info!(port = config.port, model = %config.model_name, "Server configured");

    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL_LOADER).await;
    health_registry.register(components::TRACKING_STORE).await;

    let metrics = ServiceMetrics::new();
    let loader = Arc::new(ModelLoader::new(config.model_source()));

    // Warm the cache so the first request does not pay the load. A missing
    // model is not fatal: the loader stays degraded and the predict route
    // keeps answering 503 until a model appears and the process restarts.
    match loader.load() {
        Ok(model) => {
            metrics.inc_model_loads();
            metrics.set_model_version(&config.model_name, &model.meta.trained_at.to_string());
            health_registry.set_healthy(components::MODEL_LOADER).await;
            info!(accuracy = model.meta.accuracy, "Model ready");
        }
        Err(e) => {
            warn!(error = %e, "No model loaded at startup");
            health_registry
                .set_degraded(components::MODEL_LOADER, e.to_string())
                .await;
        }
    }

    let app_state = Arc::new(api::AppState::new(
        loader,
        health_registry.clone(),
        metrics,
    ));

    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(config.port, app_state));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    api_handle.abort();

    Ok(())
}
