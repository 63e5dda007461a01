//! # filedock-entity
//!
//! Domain entity models for FileDock. Durable records derive
//! `sqlx::FromRow`; the upload session is in-process state owned by the
//! chunk staging area.

pub mod file;
pub mod upload;

pub use file::{FilePatch, NewStoredFile, StoredFile};
pub use upload::{ChunkOutcome, SessionState, UploadSession};
