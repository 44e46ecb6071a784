use crate::{models::{Document, ErrorResponse, JoinReply}, state::AppState, sync::SyncError};
use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

#[derive(Deserialize)]
pub struct DocumentListQuery {
    owner: Option<String>,
}

/// Persisted documents, all of them or those of one owner
pub async fn documents_list(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<DocumentListQuery>,
) -> Result<(StatusCode, Json<Vec<Document>>), (StatusCode, Json<ErrorResponse>)> {

    let owner = query.owner.as_deref().map(str::trim).filter(|o| !o.is_empty());
    match app_state.engine.list_documents(owner).await {
        Ok(docs) => Ok((StatusCode::OK, Json(docs))),
        Err(e) => {
            error!("Failed to list documents: {}", e);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            Err((status, Json(ErrorResponse::new(status, "Documents are unavailable"))))
        }
    }
}

/// Current content and title of a document, loading it on first access
pub async fn document_get(
    State(app_state): State<Arc<AppState>>,
    Path(doc_id): Path<String>,
) -> Result<(StatusCode, Json<JoinReply>), (StatusCode, Json<ErrorResponse>)> {

    if doc_id.trim().is_empty() {
        let status = StatusCode::BAD_REQUEST;
        return Err((status, Json(ErrorResponse::new(status, "Document ID cannot be empty"))));
    }

    match app_state.engine.coordinator().load_or_get(&doc_id).await {
        Ok(doc) => Ok((StatusCode::OK, Json(doc))),
        Err(e) => {
            error!("Failed to read document '{}': {}", doc_id, e);
            let status = match e {
                SyncError::LockTimeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((status, Json(ErrorResponse::new(status, format!("Document '{}' is unavailable", doc_id)))))
        }
    }
}
