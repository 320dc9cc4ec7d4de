//! Directory query handler.

use axum::{extract::Query, Json};

use crate::file::{list_directory, resolve_query_path, FileMetadata};
use crate::web::dto::PathQuery;
use crate::web::error::{ApiError, ErrorBody};
use crate::RelayError;

/// GET /query - List file metadata for a directory.
///
/// Relative paths resolve against the server's working directory, not the
/// storage root. A directory with no files is reported as an error.
#[utoipa::path(
    get,
    path = "/query",
    tag = "files",
    params(
        ("path" = String, Query, description = "Absolute path, or path relative to the server working directory")
    ),
    responses(
        (status = 200, description = "Metadata for each file in the directory", body = Vec<FileMetadata>),
        (status = 400, description = "Missing path parameter", body = ErrorBody),
        (status = 500, description = "Directory unreadable or contains no files", body = ErrorBody)
    )
)]
pub async fn query_files(Query(query): Query<PathQuery>) -> Result<Json<Vec<FileMetadata>>, ApiError> {
    let raw = query.require_path()?;

    let path = resolve_query_path(raw).map_err(|e| {
        tracing::warn!(path = %raw, error = %e, "Error resolving query path");
        ApiError::bad_request("Error resolving path")
    })?;

    let files = list_directory(&path).await.map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Error querying files from path");
        match e {
            RelayError::EmptyDirectory(_) => ApiError::internal("No files found in path"),
            _ => ApiError::internal("Unable to read directory"),
        }
    })?;

    tracing::debug!(path = %path.display(), count = files.len(), "Listed directory");
    Ok(Json(files))
}
