//! HTTP/REST API layer for Parley.
//!
//! Axum-based REST API with bearer-credential authentication, envelope
//! response format, and CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
