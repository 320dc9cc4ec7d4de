//! Store, retrieve, and remove handlers.

use std::io;
use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
};
use futures::TryStreamExt;
use tokio_util::io::{ReaderStream, StreamReader};

use crate::web::dto::FilenameQuery;
use crate::web::error::{ApiError, ErrorBody};
use crate::web::handlers::AppState;

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters are stripped (no header injection), quotes and
/// backslashes are replaced in the ASCII fallback, and non-ASCII names are
/// additionally sent as an RFC 5987 `filename*` parameter.
pub fn content_disposition_header(filename: &str) -> String {
    let plain = filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\');
    if plain {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let fallback: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            c => c,
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

/// Name presented to the client: the final component of the requested path.
fn attachment_name(filename: &str) -> &str {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename)
}

/// POST /post - Upload a file.
#[utoipa::path(
    post,
    path = "/post",
    tag = "files",
    params(
        ("filename" = String, Query, description = "Name to store the file under")
    ),
    request_body(content = Vec<u8>, description = "Raw file bytes", content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "File uploaded successfully"),
        (status = 400, description = "Missing or unsafe filename", body = ErrorBody),
        (status = 413, description = "Upload exceeds the configured limit", body = ErrorBody),
        (status = 500, description = "Failed to save file", body = ErrorBody)
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilenameQuery>,
    body: Body,
) -> Result<(StatusCode, &'static str), ApiError> {
    let filename = query.require_filename()?;

    let reader = StreamReader::new(body.into_data_stream().map_err(io::Error::other));

    let written = state.storage.save(filename, reader).await.map_err(|e| {
        tracing::error!(filename = %filename, error = %e, "Error saving file");
        ApiError::from_relay(e, "Failed to save file")
    })?;

    tracing::info!(filename = %filename, bytes = written, "File uploaded successfully");
    Ok((StatusCode::CREATED, "File uploaded successfully"))
}

/// GET /get - Download a file.
#[utoipa::path(
    get,
    path = "/get",
    tag = "files",
    params(
        ("filename" = String, Query, description = "Stored file name")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 400, description = "Missing or unsafe filename", body = ErrorBody),
        (status = 404, description = "File not found", body = ErrorBody),
        (status = 500, description = "Failed to send file", body = ErrorBody)
    )
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilenameQuery>,
) -> Result<Response<Body>, ApiError> {
    let filename = query.require_filename()?;

    let file = state.storage.load(filename).await.map_err(|e| {
        tracing::error!(filename = %filename, error = %e, "Error loading file");
        ApiError::from_relay(e, "Failed to load file")
    })?;

    let size = file
        .metadata()
        .await
        .map_err(|e| {
            tracing::error!(filename = %filename, error = %e, "Error reading file metadata");
            ApiError::internal("Failed to send file")
        })?
        .len();

    // The status is already committed once streaming starts; errors can only be logged.
    let logged_name = filename.to_string();
    let stream = ReaderStream::new(file).inspect_err(move |e| {
        tracing::error!(filename = %logged_name, error = %e, "Error sending file");
    });

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(attachment_name(filename)),
        )
        .header(header::CONTENT_LENGTH, size)
        .body(Body::from_stream(stream))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to send file")
        })?;

    tracing::info!(filename = %filename, bytes = size, "Sending file");
    Ok(response)
}

/// DELETE /delete - Delete a file.
#[utoipa::path(
    delete,
    path = "/delete",
    tag = "files",
    params(
        ("filename" = String, Query, description = "Stored file name")
    ),
    responses(
        (status = 200, description = "File deleted successfully"),
        (status = 400, description = "Missing or unsafe filename", body = ErrorBody),
        (status = 404, description = "File not found", body = ErrorBody),
        (status = 500, description = "Failed to delete file", body = ErrorBody)
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilenameQuery>,
) -> Result<(StatusCode, &'static str), ApiError> {
    let filename = query.require_filename()?;

    match state.storage.delete(filename).await {
        Ok(true) => {
            tracing::info!(filename = %filename, "File deleted successfully");
            Ok((StatusCode::OK, "File deleted successfully"))
        }
        Ok(false) => {
            tracing::warn!(filename = %filename, "File not found for deletion");
            Err(ApiError::not_found("File not found"))
        }
        Err(e) => {
            tracing::error!(filename = %filename, error = %e, "Error deleting file");
            Err(ApiError::from_relay(e, "Failed to delete file"))
        }
    }
}
