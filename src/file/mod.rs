//! File storage module for filerelay.
//!
//! This module provides the storage side of the transfer path:
//! - Streaming save/load/delete under a single storage root
//! - Filename normalization that keeps every path inside the root
//! - Directory listing with per-file metadata records

mod metadata;
mod storage;

pub use metadata::{extension, list_directory, resolve_query_path, FileMetadata};
pub use storage::{clean_name, FileStorage};
