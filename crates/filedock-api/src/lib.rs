//! # filedock-api
//!
//! HTTP API layer for FileDock built on Axum.
//!
//! Provides the upload intake and file endpoints, request logging,
//! extractors, DTOs, and error mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
