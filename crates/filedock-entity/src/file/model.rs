//! Stored file entity model.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use filedock_core::types::FileId;

/// A file whose bytes are committed to the storage root.
///
/// A record only exists once a readable file of `size_bytes` lives at
/// `storage_root/storage_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StoredFile {
    /// Identifier assigned by the metadata store.
    pub id: FileId,
    /// User-facing name. Never used as a path.
    pub display_name: String,
    /// Name the client uploaded the file under.
    pub client_name: String,
    /// Server-generated name addressing the bytes on disk.
    pub storage_name: String,
    /// MIME type detected from the stored bytes.
    pub mime_type: String,
    /// Size of the stored bytes.
    pub size_bytes: i64,
    /// Encoded preview image, if one could be rendered.
    #[serde(skip)]
    pub thumbnail: Option<Vec<u8>>,
    /// When the record was inserted.
    pub created_at: DateTime<Utc>,
    /// When the record was last changed.
    pub updated_at: DateTime<Utc>,
}

impl StoredFile {
    /// Absolute location of the bytes under the given storage root.
    pub fn path_in(&self, storage_root: &Path) -> PathBuf {
        storage_root.join(&self.storage_name)
    }

    /// Whether a thumbnail is attached.
    pub fn has_thumbnail(&self) -> bool {
        self.thumbnail.as_ref().is_some_and(|t| !t.is_empty())
    }

    /// Extension of the storage name (lowercase), if any.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.storage_name)
            .extension()
            .and_then(|ext| ext.to_str())
    }
}

/// Data required to insert a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStoredFile {
    /// User-facing name.
    pub display_name: String,
    /// Name the client uploaded the file under.
    pub client_name: String,
    /// Server-generated storage name.
    pub storage_name: String,
    /// Detected MIME type.
    pub mime_type: String,
    /// Size of the committed bytes.
    pub size_bytes: i64,
}

/// Partial update of a file record. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePatch {
    /// New display name.
    pub display_name: Option<String>,
    /// New thumbnail bytes.
    pub thumbnail: Option<Vec<u8>>,
}

impl FilePatch {
    /// Patch that only renames.
    pub fn rename(display_name: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            ..Self::default()
        }
    }

    /// Patch that only attaches a thumbnail.
    pub fn thumbnail(data: Vec<u8>) -> Self {
        Self {
            thumbnail: Some(data),
            ..Self::default()
        }
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.thumbnail.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StoredFile {
        StoredFile {
            id: FileId::new(),
            display_name: "report.pdf".into(),
            client_name: "report.pdf".into(),
            storage_name: "0190f3c2a1b24c1d9e8f7a6b5c4d3e2f.pdf".into(),
            mime_type: "application/pdf".into(),
            size_bytes: 9216,
            thumbnail: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_path_uses_storage_name() {
        let file = sample();
        let path = file.path_in(Path::new("/srv/files"));
        assert_eq!(
            path,
            PathBuf::from("/srv/files/0190f3c2a1b24c1d9e8f7a6b5c4d3e2f.pdf")
        );
        assert_eq!(file.extension(), Some("pdf"));
    }

    #[test]
    fn test_thumbnail_not_serialized() {
        let mut file = sample();
        file.thumbnail = Some(vec![0xff, 0xd8]);
        assert!(file.has_thumbnail());
        let json = serde_json::to_value(&file).expect("serialize");
        assert!(json.get("thumbnail").is_none());
    }

    #[test]
    fn test_empty_patch() {
        assert!(FilePatch::default().is_empty());
        assert!(!FilePatch::rename("x").is_empty());
    }
}
