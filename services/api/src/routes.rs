use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use priorauth_agent::error::AppError;
use priorauth_agent::pipeline::{
    score_decision, AppealAnalysis, AppealRequest, AuthorizationDecision, AuthorizationPipeline,
    AuthorizationRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    pub(crate) decision: AuthorizationDecision,
    #[serde(default)]
    pub(crate) ground_truth: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreResponse {
    pub(crate) request_id: String,
    pub(crate) score: f64,
    pub(crate) validator: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubnetStatus {
    pub(crate) subnet_id: &'static str,
    pub(crate) active_miners: u32,
    pub(crate) avg_response_time_ms: f64,
    pub(crate) requests_processed_24h: u64,
    pub(crate) approval_rate: f64,
    pub(crate) network: &'static str,
}

pub(crate) fn router(pipeline: Arc<AuthorizationPipeline>) -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/authorizations",
            axum::routing::post(submit_authorization_endpoint),
        )
        .route("/api/v1/appeals", axum::routing::post(analyze_appeal_endpoint))
        .route(
            "/api/v1/decisions/score",
            axum::routing::post(score_endpoint),
        )
        .route(
            "/api/v1/criteria/:code",
            axum::routing::get(criteria_endpoint),
        )
        .route(
            "/api/v1/subnet/status",
            axum::routing::get(subnet_status_endpoint),
        )
        .layer(Extension(pipeline))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": "priorauth-agent" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn submit_authorization_endpoint(
    Extension(pipeline): Extension<Arc<AuthorizationPipeline>>,
    Json(request): Json<AuthorizationRequest>,
) -> Result<Json<AuthorizationDecision>, AppError> {
    let decision = pipeline.process_authorization(request).await?;
    Ok(Json(decision))
}

pub(crate) async fn analyze_appeal_endpoint(
    Extension(pipeline): Extension<Arc<AuthorizationPipeline>>,
    Json(appeal): Json<AppealRequest>,
) -> Result<Json<AppealAnalysis>, AppError> {
    let analysis = pipeline.process_appeal(appeal).await?;
    Ok(Json(analysis))
}

pub(crate) async fn score_endpoint(Json(payload): Json<ScoreRequest>) -> Json<ScoreResponse> {
    let ScoreRequest {
        decision,
        ground_truth,
    } = payload;

    let score = score_decision(&decision, ground_truth);
    Json(ScoreResponse {
        request_id: decision.request_id,
        score,
        validator: "priorauth-agent-v1",
    })
}

pub(crate) async fn criteria_endpoint(
    Extension(pipeline): Extension<Arc<AuthorizationPipeline>>,
    axum::extract::Path(code): axum::extract::Path<String>,
) -> impl IntoResponse {
    match pipeline.criteria_for(&code) {
        Some(reference) => (StatusCode::OK, Json(json!(reference))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("no criteria found for ICD-10 code {code}") })),
        )
            .into_response(),
    }
}

pub(crate) async fn subnet_status_endpoint() -> Json<SubnetStatus> {
    Json(SubnetStatus {
        subnet_id: "TAO-PA-001",
        active_miners: 47,
        avg_response_time_ms: 340.0,
        requests_processed_24h: 1823,
        approval_rate: 0.68,
        network: "Bittensor mainnet",
    })
}
