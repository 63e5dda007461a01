//! Storage path resolution.
//!
//! Three directories back every deployment: the storage root holding
//! finished files, the chunk root holding one staging directory per upload
//! session, and the scratch root for merge outputs and thumbnail
//! temporaries. Directories are created lazily on first use.

use std::path::{Path, PathBuf};

use tracing::debug;

use filedock_core::config::StorageConfig;
use filedock_core::error::AppError;
use filedock_core::result::AppResult;

/// Longest accepted session identifier.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Resolves and creates the directories FileDock writes into.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    storage_root: PathBuf,
    chunk_root: PathBuf,
    scratch_root: PathBuf,
    dir_mode: u32,
}

impl StoragePaths {
    /// Build from the storage section of the configuration.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            storage_root: config.storage_root.clone(),
            chunk_root: config.chunk_root.clone(),
            scratch_root: config.scratch_root.clone(),
            dir_mode: config.dir_mode,
        }
    }

    /// Directory of finished files, created if missing.
    pub async fn resolve_storage_root(&self) -> AppResult<PathBuf> {
        ensure_dir(&self.storage_root, self.dir_mode).await?;
        Ok(self.storage_root.clone())
    }

    /// Staging directory of one upload session, created if missing.
    pub async fn resolve_chunk_root(&self, session_id: &str) -> AppResult<PathBuf> {
        let dir = self.session_dir(session_id)?;
        ensure_dir(&dir, self.dir_mode).await?;
        Ok(dir)
    }

    /// Scratch directory, created if missing.
    pub async fn resolve_scratch_root(&self) -> AppResult<PathBuf> {
        ensure_dir(&self.scratch_root, self.dir_mode).await?;
        Ok(self.scratch_root.clone())
    }

    /// Staging directory path of a session, without touching the filesystem.
    pub fn session_dir(&self, session_id: &str) -> AppResult<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.chunk_root.join(session_id))
    }

    /// Parent of every session staging directory.
    pub fn chunk_root(&self) -> &Path {
        &self.chunk_root
    }

    /// Scratch directory path, without touching the filesystem.
    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Storage root path, without touching the filesystem.
    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }
}

/// Reject session identifiers that could escape the chunk root.
///
/// Only ASCII letters, digits, `-` and `_` are accepted.
pub fn validate_session_id(session_id: &str) -> AppResult<()> {
    if session_id.is_empty() || session_id.len() > MAX_SESSION_ID_LEN {
        return Err(AppError::validation(format!(
            "Upload session id must be 1-{MAX_SESSION_ID_LEN} characters"
        )));
    }
    if !session_id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(AppError::validation(format!(
            "Upload session id '{session_id}' contains invalid characters"
        )));
    }
    Ok(())
}

/// Create `path` and its parents with `mode`. Succeeds if it already exists.
async fn ensure_dir(path: &Path, mode: u32) -> AppResult<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;

    builder
        .create(path)
        .await
        .map_err(|e| AppError::directory_unavailable(path, e))?;

    // A concurrent creator may have won the race with a regular file.
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| AppError::directory_unavailable(path, e))?;
    if !meta.is_dir() {
        return Err(AppError::directory_unavailable(
            path,
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "not a directory"),
        ));
    }

    debug!(path = %path.display(), "Directory ready");
    Ok(())
}
