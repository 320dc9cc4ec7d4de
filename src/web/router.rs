//! Router configuration for the HTTP surface.

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    delete_file, download_file, forward_live_stream, forward_stored_file, method_not_allowed,
    query_files, upload_file, AppState,
};
use super::middleware::create_cors_layer;

/// Create the file transfer router.
///
/// Each path accepts exactly one method; anything else gets a JSON 405.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let transfer_routes = Router::new()
        .route("/post", post(upload_file).fallback(method_not_allowed))
        .route("/get", get(download_file).fallback(method_not_allowed))
        .route("/delete", delete(delete_file).fallback(method_not_allowed))
        .route("/query", get(query_files).fallback(method_not_allowed));

    let forward_routes = Router::new()
        .route(
            "/post/forward",
            post(forward_live_stream).fallback(method_not_allowed),
        )
        .route(
            "/forward",
            post(forward_stored_file).fallback(method_not_allowed),
        );

    Router::new()
        .merge(transfer_routes)
        .merge(forward_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
