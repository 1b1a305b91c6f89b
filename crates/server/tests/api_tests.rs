//! Integration tests for the prediction API endpoints

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stroke_lib::{
    health::{components, ComponentStatus, HealthRegistry},
    predictor::{ForestParams, ModelLoader, ModelSource},
    preprocess,
    schema::PredictionRequest,
    trainer, Error, RawRecord, ServiceMetrics,
};
use tower::ServiceExt;

#[derive(Clone)]
pub struct AppState {
    pub loader: Arc<ModelLoader>,
    pub health_registry: HealthRegistry,
    pub metrics: ServiceMetrics,
}

struct ApiError(Error);

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

async fn root() -> Redirect {
    Redirect::to("/docs")
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    request.validate().map_err(ApiError)?;
    let model = state.loader.load().map_err(ApiError)?;
    let outcome = model.predict_row(&request.to_row()).map_err(ApiError)?;
    state.metrics.inc_predictions();
    Ok(Json(serde_json::json!({ "Stroke": outcome })))
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;
    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;
    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(readiness))
}

fn create_test_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .with_state(state)
}

fn raw_record(id: u32, age: f64, glucose: f64, smoking: &str, stroke: u8) -> RawRecord {
    RawRecord {
        id,
        gender: if id % 2 == 0 { "Male" } else { "Female" }.to_string(),
        age,
        hypertension: stroke,
        heart_disease: 0,
        ever_married: "Yes".to_string(),
        work_type: if id % 3 == 0 { "Private" } else { "Self-employed" }.to_string(),
        residence_type: "Urban".to_string(),
        avg_glucose_level: glucose,
        bmi: Some(25.0 + f64::from(id % 7)),
        smoking_status: smoking.to_string(),
        stroke,
    }
}

/// Train a small model through the real preprocessing pipeline and write
/// its artifact into `dir`.
fn train_test_model(dir: &Path) -> PathBuf {
    let mut records = Vec::new();
    for i in 0..40u32 {
        records.push(raw_record(i * 2, 30.0 + f64::from(i % 10), 85.0, "never smoked", 0));
        records.push(raw_record(i * 2 + 1, 70.0 + f64::from(i % 10), 220.0, "smokes", 1));
    }
    let data = preprocess::clean_and_encode(&records).unwrap();
    let params = ForestParams {
        max_depth: Some(6),
        n_trees: 15,
        seed: 42,
    };
    let report = trainer::train_holdout(&data, params).unwrap();

    let path = dir.join("model.bin");
    std::fs::write(&path, report.model.to_bytes().unwrap()).unwrap();
    path
}

fn app_with_loader(loader: ModelLoader) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        loader: Arc::new(loader),
        health_registry: HealthRegistry::new(),
        metrics: ServiceMetrics::new(),
    });
    (create_test_router(state.clone()), state)
}

fn setup_app_with_model() -> (Router, Arc<AppState>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let model_path = train_test_model(dir.path());
    let (router, state) = app_with_loader(ModelLoader::new(ModelSource::File(model_path)));
    (router, state, dir)
}

fn setup_app_without_model() -> (Router, Arc<AppState>) {
    app_with_loader(ModelLoader::new(ModelSource::File(PathBuf::from(
        "missing/model.bin",
    ))))
}

fn post_predict(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_default_record_round_trips() {
    let (app, _state, _dir) = setup_app_with_model();

    let response = app.oneshot(post_predict(serde_json::json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let outcome = body["Stroke"].as_u64().unwrap();
    assert!(outcome == 0 || outcome == 1, "outcome was {outcome}");
}

#[tokio::test]
async fn test_high_risk_record_predicts_stroke() {
    let (app, _state, _dir) = setup_app_with_model();

    let body = serde_json::json!({
        "age": 75.0,
        "avg_glucose_level": 220.0,
        "bmi": 28.0,
        "hypertension": 1,
        "smoking_status_never_smoked": 0,
        "smoking_status_smokes": 1,
    });
    let response = app.oneshot(post_predict(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["Stroke"], 1);
}

#[tokio::test]
async fn test_flag_outside_domain_is_rejected() {
    let (app, _state, _dir) = setup_app_with_model();

    let response = app
        .oneshot(post_predict(serde_json::json!({ "hypertension": 2 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert_eq!(body["field"], "hypertension");
}

#[tokio::test]
async fn test_wrong_type_is_rejected_by_the_extractor() {
    let (app, _state, _dir) = setup_app_with_model();

    let response = app
        .oneshot(post_predict(serde_json::json!({ "age": "sixty" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_missing_model_returns_service_unavailable() {
    let (app, _state) = setup_app_without_model();

    let response = app.oneshot(post_predict(serde_json::json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = response_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("no model available"));
}

#[tokio::test]
async fn test_model_loads_once_across_requests() {
    let (_app, state, _dir) = setup_app_with_model();

    for _ in 0..2 {
        let app = create_test_router(state.clone());
        let response = app.oneshot(post_predict(serde_json::json!({}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(state.loader.load_count(), 1);
}

#[tokio::test]
async fn test_root_redirects_to_docs() {
    let (app, _state) = setup_app_without_model();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(response.headers()["location"], "/docs");
}

#[tokio::test]
async fn test_healthz_reports_degraded_loader_as_operational() {
    let (app, state) = setup_app_without_model();
    state
        .health_registry
        .register(components::MODEL_LOADER)
        .await;
    state
        .health_registry
        .set_degraded(components::MODEL_LOADER, "no model registered")
        .await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health = response_json(response).await;
    assert_eq!(health["status"], "degraded");
}

#[tokio::test]
async fn test_readyz_flips_with_initialization() {
    let (_app, state) = setup_app_without_model();

    let app = create_test_router(state.clone());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    state.health_registry.set_ready(true).await;
    let app = create_test_router(state.clone());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
