//! filerelay - streaming HTTP file store
//!
//! Stores uploaded files under a single root directory, streams them back,
//! lists directory metadata, and relays stored or live data to other servers.

pub mod config;
pub mod error;
pub mod file;
pub mod forward;
pub mod logging;
pub mod web;

pub use config::Config;
pub use error::{RelayError, Result};
pub use file::{FileMetadata, FileStorage};
pub use forward::Forwarder;
pub use web::WebServer;
