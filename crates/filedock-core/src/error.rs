//! Unified application error types for FileDock.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The [`ErrorKind`] is what callers
//! branch on: each upload failure mode has its own kind so the presentation
//! layer can tell a directory problem from a missing or corrupt upload.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Error categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// A storage, staging, or scratch directory is missing and cannot be created.
    DirectoryUnavailable,
    /// A chunk reported a different total chunk count than its session.
    InconsistentChunkCount,
    /// A chunk could not be written into its staging directory.
    StagingWriteFailed,
    /// A merge was requested for a session without staged chunks.
    NoChunksFound,
    /// A merge was requested before every chunk index arrived.
    IncompleteChunkSet,
    /// The session is already being merged.
    MergeInProgress,
    /// The merge output file could not be created.
    OutputCreateFailed,
    /// A staged chunk could not be opened or read during a merge.
    ChunkReadFailed,
    /// No metadata record exists for the given identifier.
    RecordNotFound,
    /// Input validation failed.
    Validation,
    /// The caller lacks the capability required for the operation.
    Forbidden,
    /// Any other storage I/O failure.
    Storage,
    /// A metadata store failure.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DirectoryUnavailable => "DIRECTORY_UNAVAILABLE",
            Self::InconsistentChunkCount => "INCONSISTENT_CHUNK_COUNT",
            Self::StagingWriteFailed => "STAGING_WRITE_FAILED",
            Self::NoChunksFound => "NO_CHUNKS_FOUND",
            Self::IncompleteChunkSet => "INCOMPLETE_CHUNK_SET",
            Self::MergeInProgress => "MERGE_IN_PROGRESS",
            Self::OutputCreateFailed => "OUTPUT_CREATE_FAILED",
            Self::ChunkReadFailed => "CHUNK_READ_FAILED",
            Self::RecordNotFound => "RECORD_NOT_FOUND",
            Self::Validation => "VALIDATION",
            Self::Forbidden => "FORBIDDEN",
            Self::Storage => "STORAGE",
            Self::Database => "DATABASE",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The unified application error used throughout FileDock.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether this error is of the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// A directory could not be found or created.
    pub fn directory_unavailable(path: &Path, source: std::io::Error) -> Self {
        Self::with_source(
            ErrorKind::DirectoryUnavailable,
            format!("Directory unavailable: {}", path.display()),
            source,
        )
    }

    /// A chunk disagreed with its session's expected chunk count.
    pub fn inconsistent_chunk_count(session_id: &str, expected: u32, reported: u32) -> Self {
        Self::new(
            ErrorKind::InconsistentChunkCount,
            format!(
                "Upload session '{session_id}' expects {expected} chunks but chunk reported {reported}"
            ),
        )
    }

    /// A chunk could not be staged.
    pub fn staging_write_failed(path: &Path, source: std::io::Error) -> Self {
        Self::with_source(
            ErrorKind::StagingWriteFailed,
            format!("Failed to stage chunk at {}", path.display()),
            source,
        )
    }

    /// No chunks are staged for the session.
    pub fn no_chunks_found(session_id: &str) -> Self {
        Self::new(
            ErrorKind::NoChunksFound,
            format!("No chunks found for upload session '{session_id}'"),
        )
    }

    /// Some chunk indices are still missing.
    pub fn incomplete_chunk_set(session_id: &str, missing: &[u32]) -> Self {
        Self::new(
            ErrorKind::IncompleteChunkSet,
            format!("Upload session '{session_id}' is missing chunks: {missing:?}"),
        )
    }

    /// The session is being merged by another request.
    pub fn merge_in_progress(session_id: &str) -> Self {
        Self::new(
            ErrorKind::MergeInProgress,
            format!("Upload session '{session_id}' is already being merged"),
        )
    }

    /// The merge output could not be opened for writing.
    pub fn output_create_failed(path: &Path, source: std::io::Error) -> Self {
        Self::with_source(
            ErrorKind::OutputCreateFailed,
            format!("Failed to create merge output {}", path.display()),
            source,
        )
    }

    /// A staged chunk could not be read.
    pub fn chunk_read_failed(path: &Path, source: std::io::Error) -> Self {
        Self::with_source(
            ErrorKind::ChunkReadFailed,
            format!("Failed to read chunk {}", path.display()),
            source,
        )
    }

    /// No metadata record matches.
    pub fn record_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RecordNotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
