use std::sync::Arc;
use axum::{extract::State, http::StatusCode, Json};
use crate::models::HealthResponse;
use crate::state::AppState;
use tracing::debug;

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
    })
}

/// Readiness check endpoint
///
/// Not ready once the edit pipeline has begun shutting down.
pub async fn ready_check(State(app_state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    debug!("Readiness check requested");
    if app_state.engine.is_running() {
        (StatusCode::OK, Json(HealthResponse {
            status: "ok".to_string(),
            message: "Service is ready".to_string(),
        }))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse {
            status: "stopping".to_string(),
            message: "Service is shutting down".to_string(),
        }))
    }
}
