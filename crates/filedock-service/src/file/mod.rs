//! File services: commit, upload intake, and record management.

pub mod name;
pub mod record;
pub mod service;
pub mod upload;

pub use record::FileRecordBuilder;
pub use service::{FileService, UserListing};
pub use upload::{ChunkUpload, UploadOutcome, UploadService};
