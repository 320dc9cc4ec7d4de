//! Directory listing and file metadata records.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;
use utoipa::ToSchema;

use super::storage::is_temp_upload;
use crate::{RelayError, Result};

/// Read-only projection of a filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FileMetadata {
    /// Entry name (no directory components).
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub mod_time: DateTime<Utc>,
    /// Suffix from the final `.` of the name, dot included; empty if none.
    pub extension: String,
}

/// Extension of a file name, including the leading dot.
///
/// `a.tar.gz` yields `.gz`, `.bashrc` yields `.bashrc`, `README` yields `""`.
pub fn extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[idx..],
        None => "",
    }
}

/// Collapse `.` and `..` segments without touching the filesystem.
///
/// Leading `..` segments of relative paths are kept; `..` directly under the
/// root is dropped.
fn lexical_clean(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        PathBuf::from(".")
    } else {
        out.iter().collect()
    }
}

/// Resolve a listing path to an absolute location.
///
/// Absolute paths are used as given (after cleaning); relative paths resolve
/// against the process working directory, not the storage root.
pub fn resolve_query_path(raw: &str) -> Result<PathBuf> {
    if raw.is_empty() {
        return Err(RelayError::Validation("path is required".to_string()));
    }

    let cleaned = lexical_clean(Path::new(raw));
    if cleaned.is_absolute() {
        return Ok(cleaned);
    }

    let cwd = std::env::current_dir()?;
    Ok(lexical_clean(&cwd.join(cleaned)))
}

/// List metadata for every non-directory entry in `dir`, sorted by name.
///
/// In-flight uploads are skipped.
///
/// A directory without any files is reported as [`RelayError::EmptyDirectory`].
pub async fn list_directory(dir: &Path) -> Result<Vec<FileMetadata>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut records = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if metadata.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if is_temp_upload(&name) {
            continue;
        }
        let mod_time = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| DateTime::<Utc>::from(std::time::UNIX_EPOCH));

        records.push(FileMetadata {
            extension: extension(&name).to_string(),
            name,
            size: metadata.len(),
            mod_time,
        });
    }

    if records.is_empty() {
        return Err(RelayError::EmptyDirectory(dir.display().to_string()));
    }

    records.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(records)
}
