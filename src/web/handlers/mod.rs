//! HTTP handlers.

pub mod file;
pub mod forward;
pub mod query;

pub use file::*;
pub use forward::*;
pub use query::*;

use axum::http::{Method, Uri};

use crate::file::FileStorage;
use crate::forward::Forwarder;
use crate::web::error::ApiError;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Storage accessor for the configured root.
    pub storage: FileStorage,
    /// Outbound relay client.
    pub forwarder: Forwarder,
}

impl AppState {
    /// Create a new application state.
    pub fn new(storage: FileStorage, forwarder: Forwarder) -> Self {
        Self { storage, forwarder }
    }
}

/// Fallback for a routed path hit with an unsupported method.
pub async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    tracing::debug!(method = %method, path = %uri.path(), "Method not allowed");
    ApiError::method_not_allowed(format!("Method {method} is not supported on {}", uri.path()))
}
