use crate::{handlers::{diagnostics, document_get, documents_list, health_check, ready_check}, state::AppState};
use axum::{routing::get, Router};
use std::sync::Arc;

/// Create API routes
pub fn create_api_routes(app_state: Arc<AppState>) -> Router {
    Router::<Arc<AppState>>::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/v1/diagnostics", get(diagnostics))
        .route("/v1/documents", get(documents_list))
        .route("/v1/documents/:doc_id", get(document_get))
        .with_state(app_state)
}
