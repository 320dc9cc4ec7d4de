//! HTTP surface for filerelay.
//!
//! Thin axum layer over the storage accessor and forwarder: query parameter
//! validation, streaming bodies in and out, and status mapping.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
