use utoipa::OpenApi;
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse),
        (status = 503, description = "Service is shutting down", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// Pipeline and process diagnostics
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Current statistics", body = DiagnosticsResponse),
        (status = 503, description = "Coordinator busy", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

/// Persisted documents
#[utoipa::path(
    get,
    path = "/api/v1/documents",
    params(
        ("owner" = Option<String>, Query, description = "Only documents of this owner")
    ),
    responses(
        (status = 200, description = "Documents ordered by id", body = [Document]),
        (status = 500, description = "Store unavailable", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn documents_list_doc() {}

/// Current content of a document
#[utoipa::path(
    get,
    path = "/api/v1/documents/{doc_id}",
    params(
        ("doc_id" = String, Path, description = "Document identifier")
    ),
    responses(
        (status = 200, description = "Document content and title", body = JoinReply),
        (status = 503, description = "Coordinator busy", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn document_get_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        diagnostics_doc,
        documents_list_doc,
        document_get_doc,
    ),
    components(
        schemas(HealthResponse, DiagnosticsResponse, ErrorResponse, Document, JoinReply)
    ),
    tags(
        (name = "api", description = "API endpoints")
    )
)]
pub struct ApiDoc;
