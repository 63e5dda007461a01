//! # filedock-core
//!
//! Core crate for FileDock. Contains configuration schemas, typed
//! identifiers, request capability types, the thumbnail pipeline contract,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other FileDock crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
