//! Query parameter DTOs.
//!
//! Every field is optional so a missing parameter reaches the handler and is
//! rejected with the endpoint's own 400 message instead of an extractor error.

use serde::Deserialize;

use crate::web::error::ApiError;

fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, ApiError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(message)),
    }
}

/// `?filename=` for store, retrieve, and remove.
#[derive(Debug, Default, Deserialize)]
pub struct FilenameQuery {
    /// Logical filename under the storage root.
    pub filename: Option<String>,
}

impl FilenameQuery {
    /// The filename, or 400 if absent or empty.
    pub fn require_filename(&self) -> Result<&str, ApiError> {
        required(&self.filename, "Filename is required")
    }
}

/// `?fileName=&target=` for both forwarding variants.
#[derive(Debug, Default, Deserialize)]
pub struct ForwardQuery {
    /// Filename to store under on the target.
    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
    /// Base URL of the target server.
    pub target: Option<String>,
}

impl ForwardQuery {
    /// `(file_name, target)`, or 400 naming the first missing parameter.
    pub fn require(&self) -> Result<(&str, &str), ApiError> {
        let file_name = required(&self.file_name, "Filename is required")?;
        let target = required(&self.target, "Target URL is required for forwarding")?;
        Ok((file_name, target))
    }
}

/// `?path=` for directory listing.
#[derive(Debug, Default, Deserialize)]
pub struct PathQuery {
    /// Absolute path, or path relative to the working directory.
    pub path: Option<String>,
}

impl PathQuery {
    /// The path, or 400 if absent or empty.
    pub fn require_path(&self) -> Result<&str, ApiError> {
        required(&self.path, "Path parameter is required")
    }
}
