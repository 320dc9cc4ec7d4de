//! OpenAPI document for the HTTP surface.

use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::file::FileMetadata;
use crate::web::error::{ErrorBody, ErrorCode, ErrorDetail};
use crate::web::handlers;

/// OpenAPI description of every endpoint.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "filerelay",
        description = "Streaming HTTP file store with server-to-server forwarding"
    ),
    paths(
        handlers::file::upload_file,
        handlers::file::download_file,
        handlers::file::delete_file,
        handlers::query::query_files,
        handlers::forward::forward_stored_file,
        handlers::forward::forward_live_stream,
    ),
    components(schemas(FileMetadata, ErrorBody, ErrorDetail, ErrorCode)),
    tags(
        (name = "files", description = "Store, retrieve, delete, and list files"),
        (name = "forward", description = "Relay files to another server")
    )
)]
pub struct ApiDoc;

/// Router serving the OpenAPI JSON at `/api-docs/openapi.json`.
pub fn create_openapi_router() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}
