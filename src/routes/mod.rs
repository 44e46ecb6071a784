pub mod api;

pub use api::create_api_routes;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{docs::ApiDoc, state::AppState, websocket::websocket_handler};

/// Assemble the full application router
pub fn create_app(app_state: Arc<AppState>) -> Router {
    let ws_routes = Router::<Arc<AppState>>::new()
        .route("/ws", get(websocket_handler))
        .with_state(app_state.clone());

    Router::new()
        // Mount API routes
        .nest("/api", create_api_routes(app_state))
        .merge(ws_routes)
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add tracing layer
        .layer(TraceLayer::new_for_http())
}
