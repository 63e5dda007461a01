//! Stored file entities.

pub mod model;

pub use model::{FilePatch, NewStoredFile, StoredFile};
