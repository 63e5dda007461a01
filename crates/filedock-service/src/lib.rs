//! # filedock-service
//!
//! Business logic service layer for FileDock. Services orchestrate the
//! metadata store and the storage crate to implement uploads, commits and
//! file management.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time.

pub mod context;
pub mod file;

pub use context::RequestContext;
pub use file::{FileRecordBuilder, FileService, UploadOutcome, UploadService, UserListing};
