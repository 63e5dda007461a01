//! Response DTOs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::Serialize;

use filedock_core::types::{AccessLevel, FileId};
use filedock_entity::file::StoredFile;
use filedock_service::{UploadOutcome, UserListing};

/// Standard API success response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Always `true` for success.
    pub success: bool,
    /// Response payload.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap data in a success response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// A stored file as seen by clients.
#[derive(Debug, Clone, Serialize)]
pub struct FileResponse {
    /// File id.
    pub id: FileId,
    /// User-facing name.
    pub display_name: String,
    /// Name the file was uploaded under.
    pub client_name: String,
    /// Server-side name of the bytes.
    pub storage_name: String,
    /// Detected MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size_bytes: i64,
    /// Thumbnail as a `data:` URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl From<StoredFile> for FileResponse {
    fn from(f: StoredFile) -> Self {
        let thumbnail = f
            .thumbnail
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| format!("data:image/jpeg;base64,{}", STANDARD.encode(t)));
        Self {
            id: f.id,
            display_name: f.display_name,
            client_name: f.client_name,
            storage_name: f.storage_name,
            mime_type: f.mime_type,
            size_bytes: f.size_bytes,
            thumbnail,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

/// Result of an upload request.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadResponse {
    /// Chunk staged, more expected.
    Pending {
        /// Chunks staged so far.
        received: u32,
        /// Chunks in the upload.
        total: u32,
    },
    /// All chunks staged; another request is assembling the file.
    Merging {
        /// Chunks in the upload.
        total: u32,
    },
    /// File stored.
    Stored {
        /// The new file.
        file: FileResponse,
    },
}

impl From<UploadOutcome> for UploadResponse {
    fn from(outcome: UploadOutcome) -> Self {
        match outcome {
            UploadOutcome::Pending { received, total } => Self::Pending { received, total },
            UploadOutcome::Merging { total } => Self::Merging { total },
            UploadOutcome::Stored { file } => Self::Stored { file: file.into() },
        }
    }
}

/// Files of one user.
#[derive(Debug, Serialize)]
pub struct UserFilesResponse {
    /// What the viewer may do with the listing.
    pub access: AccessLevel,
    /// The files.
    pub files: Vec<FileResponse>,
}

impl From<UserListing> for UserFilesResponse {
    fn from(listing: UserListing) -> Self {
        Self {
            access: listing.access,
            files: listing.files.into_iter().map(FileResponse::from).collect(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Server version.
    pub version: String,
}
