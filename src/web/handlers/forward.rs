//! Forwarding handlers.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
};
use futures::TryStreamExt;
use url::Url;

use crate::forward::Forwarder;
use crate::web::dto::ForwardQuery;
use crate::web::error::{ApiError, ErrorBody};
use crate::web::handlers::AppState;

const FORWARD_FAILED: &str = "Failed to forward data to target";

/// Build the outbound URL. Only a malformed target is the caller's fault.
fn outbound_url(target: &str, filename: &str) -> Result<Url, ApiError> {
    Forwarder::target_url(target, filename).map_err(|e| {
        tracing::warn!(target = %target, error = %e, "Invalid forward target");
        ApiError::from_relay(e, "Invalid target URL")
    })
}

/// POST /forward - Relay a stored file to another server.
///
/// The target's status, content type, and body are passed back unchanged.
/// Any failure to load the stored file is an internal error.
#[utoipa::path(
    post,
    path = "/forward",
    tag = "forward",
    params(
        ("fileName" = String, Query, description = "Stored file to forward"),
        ("target" = String, Query, description = "Base URL of the target server")
    ),
    responses(
        (status = 200, description = "Relayed response from the target (status varies)"),
        (status = 400, description = "Missing parameter or invalid target", body = ErrorBody),
        (status = 500, description = "Failed to load or forward the file", body = ErrorBody)
    )
)]
pub async fn forward_stored_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ForwardQuery>,
) -> Result<Response<Body>, ApiError> {
    let (filename, target) = query.require()?;
    let url = outbound_url(target, filename)?;

    let upstream = state
        .forwarder
        .forward_stored(&state.storage, filename, &url)
        .await
        .map_err(|e| {
            tracing::error!(filename = %filename, target = %target, error = %e, "Failed to forward file");
            ApiError::internal(FORWARD_FAILED)
        })?;

    let mut builder = Response::builder().status(upstream.status());
    if let Some(content_type) = upstream.headers().get(header::CONTENT_TYPE) {
        builder = builder.header(header::CONTENT_TYPE, content_type.clone());
    }

    let logged_target = target.to_string();
    let body = upstream.bytes_stream().inspect_err(move |e| {
        tracing::error!(target = %logged_target, error = %e, "Error copying response body");
    });

    builder.body(Body::from_stream(body)).map_err(|e| {
        tracing::error!("Failed to build response: {}", e);
        ApiError::internal("Failed to relay response")
    })
}

/// POST /post/forward - Pipe the request body straight to another server.
///
/// Once the target has answered the caller gets 200, whatever the target's
/// status was; only transport failures are reported as errors.
#[utoipa::path(
    post,
    path = "/post/forward",
    tag = "forward",
    params(
        ("fileName" = String, Query, description = "Name to store under on the target"),
        ("target" = String, Query, description = "Base URL of the target server")
    ),
    request_body(content = Vec<u8>, description = "Raw bytes to relay", content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Data delivered to the target"),
        (status = 400, description = "Missing parameter or invalid target", body = ErrorBody),
        (status = 500, description = "Failed to forward data", body = ErrorBody)
    )
)]
pub async fn forward_live_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ForwardQuery>,
    body: Body,
) -> Result<StatusCode, ApiError> {
    let (filename, target) = query.require()?;
    let url = outbound_url(target, filename)?;

    let status = state
        .forwarder
        .forward_stream(body.into_data_stream(), &url)
        .await
        .map_err(|e| {
            tracing::error!(filename = %filename, target = %target, error = %e, "Failed to forward data");
            ApiError::internal(FORWARD_FAILED)
        })?;

    if !status.is_success() {
        tracing::warn!(filename = %filename, target = %target, status = status.as_u16(), "Target rejected forwarded data");
    }
    tracing::info!(filename = %filename, "Data transfer completed");
    Ok(StatusCode::OK)
}
