//! HTTP API layer.
//!
//! - [`models`]: request/response types with OpenAPI schemas
//! - [`handlers`]: axum handlers, grouped by resource

pub mod handlers;
pub mod models;
