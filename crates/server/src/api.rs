//! HTTP API for predictions, health checks and Prometheus metrics

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use std::time::Instant;
use stroke_lib::{
    health::{ComponentStatus, HealthRegistry},
    predictor::ModelLoader,
    schema::PredictionRequest,
    Error, ServiceMetrics,
};
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub loader: Arc<ModelLoader>,
    pub health_registry: HealthRegistry,
    pub metrics: ServiceMetrics,
}

impl AppState {
    pub fn new(
        loader: Arc<ModelLoader>,
        health_registry: HealthRegistry,
        metrics: ServiceMetrics,
    ) -> Self {
        Self {
            loader,
            health_registry,
            metrics,
        }
    }
}

/// Error response; carries the offending field for schema violations.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, field) = match &self.0 {
            Error::SchemaViolation { field, .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, Some(field.clone()))
            }
            Error::ModelUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, None),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };
        let mut body = serde_json::json!({ "error": self.0.to_string() });
        if let Some(field) = field {
            body["field"] = field.into();
        }
        (status, Json(body)).into_response()
    }
}

/// Interactive docs live at /docs; the root only points there.
async fn root() -> Redirect {
    Redirect::to("/docs")
}

/// API description: endpoints, the request field list and a valid default
/// body.
async fn docs() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "stroke-predictor",
        "endpoints": {
            "POST /predict": "binary stroke prediction for one record",
            "GET /healthz": "component health",
            "GET /readyz": "readiness",
            "GET /metrics": "Prometheus metrics",
        },
        "request_fields": PredictionRequest::field_names(),
        "default_request": PredictionRequest::default(),
    }))
}

/// Validate the request, run it through the cached model and return the
/// binary outcome.
async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let started = Instant::now();
    let loads_before = state.loader.load_count();

    match run_prediction(&state, &request) {
        Ok(outcome) => {
            if state.loader.load_count() > loads_before {
                state.metrics.inc_model_loads();
            }
            state
                .metrics
                .observe_prediction_latency(started.elapsed().as_secs_f64());
            state.metrics.inc_predictions();
            info!(outcome, "Prediction served");
            Ok(Json(serde_json::json!({ "Stroke": outcome })))
        }
        Err(e) => {
            state.metrics.inc_prediction_errors();
            Err(e.into())
        }
    }
}

fn run_prediction(state: &AppState, request: &PredictionRequest) -> stroke_lib::Result<u32> {
    request.validate()?;
    let model = state.loader.load()?;
    model.predict_row(&request.to_row())
}

/// Health check response - returns 200 if healthy or degraded, 503 otherwise
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/docs", get(docs))
        .route("/predict", post(predict))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
