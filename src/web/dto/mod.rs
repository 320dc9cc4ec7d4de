//! Data Transfer Objects for the HTTP surface.

pub mod request;

pub use request::*;
