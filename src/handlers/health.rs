use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use tracing::info;

use crate::config::ModelBackend;
use crate::error::AppResult;
use crate::state::AppState;

/// Health check endpoint
pub async fn health_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let timestamp = chrono::Utc::now().to_rfc3339();
    let metrics = state.limiter.metrics();
    let models = &state.models;

    let status = match models.backend() {
        ModelBackend::Onnx => "healthy",
        ModelBackend::Stub => "degraded",
    };

    let response = json!({
        "status": status,
        "timestamp": timestamp,
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "pdf_extractor": true,
            "model_backend": format!("{:?}", models.backend()).to_lowercase(),
            "detector": models.detector().name(),
            "summarizer": models.summarizer().name()
        },
        "rate_limiting": {
            "total_requests": metrics.total_requests,
            "rejected_requests": metrics.rejected_requests,
            "available_permits": metrics.available_permits,
            "max_concurrent_requests": metrics.max_permits,
            "rejection_rate": (metrics.rejection_rate() * 100.0).round() / 100.0
        },
        "uptime_seconds": state.started_at.elapsed().as_secs()
    });

    info!(status = status, "Health check completed");

    Ok(Json(response))
}

/// Readiness check endpoint. The router is only built around a loaded
/// model set, so an answering server is ready; busy analysis slots surface
/// as 429 on the analyze routes instead.
pub async fn ready_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ready",
        "model_backend": format!("{:?}", state.models.backend()).to_lowercase()
    }))
}
