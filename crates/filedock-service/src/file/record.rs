//! Commit of assembled files into storage and the metadata store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use filedock_core::config::StorageConfig;
use filedock_core::error::{AppError, ErrorKind};
use filedock_core::result::AppResult;
use filedock_core::traits::thumbnail::ThumbnailPipeline;
use filedock_core::types::UserId;
use filedock_database::MetadataStore;
use filedock_entity::file::{FilePatch, NewStoredFile, StoredFile};
use filedock_storage::StoragePaths;
use filedock_storage::identity::unused_storage_name;
use filedock_storage::mime::detect_mime;

use super::name::display_name_from;

/// Removes a file when dropped unless disarmed.
struct FileGuard {
    path: PathBuf,
    armed: bool,
}

impl FileGuard {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Turns an assembled file into a stored file with a metadata record.
///
/// Bytes are placed first and the record inserted second, so a record is
/// never visible for a file that is not fully on disk.
#[derive(Debug, Clone)]
pub struct FileRecordBuilder {
    store: Arc<dyn MetadataStore>,
    paths: StoragePaths,
    thumbnails: Option<Arc<dyn ThumbnailPipeline>>,
    file_mode: u32,
}

impl FileRecordBuilder {
    /// Create a builder. `thumbnails` is `None` when thumbnailing is off.
    pub fn new(
        store: Arc<dyn MetadataStore>,
        paths: StoragePaths,
        thumbnails: Option<Arc<dyn ThumbnailPipeline>>,
        config: &StorageConfig,
    ) -> Self {
        Self {
            store,
            paths,
            thumbnails,
            file_mode: config.file_mode,
        }
    }

    /// Move `source` into the storage root and record it.
    ///
    /// `source` is consumed: it is gone after this call whatever the
    /// outcome. If `owner` cannot be associated, the record and the stored
    /// bytes are removed again and the error is returned. Thumbnails are
    /// attempted for `image/*` files only, and a thumbnail failure never
    /// fails the commit.
    pub async fn commit(
        &self,
        source: &Path,
        client_name: &str,
        owner: Option<UserId>,
    ) -> AppResult<StoredFile> {
        let _source_guard = FileGuard::new(source);

        let display_name = display_name_from(client_name)?;
        let root = self.paths.resolve_storage_root().await?;
        let storage_name = unused_storage_name(&root, &display_name).await?;
        let destination = root.join(&storage_name);

        move_into_place(source, &destination).await?;
        let mut placed = FileGuard::new(&destination);
        self.apply_file_mode(&destination).await?;

        let size_bytes = tokio::fs::metadata(&destination)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to stat stored file", e)
            })?
            .len();
        let mime_type = detect_mime(&destination).await?;

        let record = self
            .store
            .insert(&NewStoredFile {
                display_name,
                client_name: client_name.to_string(),
                storage_name,
                mime_type,
                size_bytes: i64::try_from(size_bytes)
                    .map_err(|_| AppError::validation("File is too large to record"))?,
            })
            .await?;

        if let Some(owner) = owner {
            if let Err(e) = self.store.add_association(record.id, owner).await {
                self.roll_back(&record, &mut placed).await;
                return Err(e);
            }
        }
        placed.disarm();

        info!(
            file_id = %record.id,
            storage_name = %record.storage_name,
            display_name = %record.display_name,
            mime_type = %record.mime_type,
            size = record.size_bytes,
            "File committed"
        );

        Ok(match &self.thumbnails {
            Some(pipeline) if record.mime_type.starts_with("image/") => {
                self.attach_thumbnail(pipeline.as_ref(), record, &destination).await
            }
            _ => record,
        })
    }

    /// Undo an insert whose commit cannot complete. The bytes stay on disk
    /// if the record cannot be removed, so a record never outlives its file.
    async fn roll_back(&self, record: &StoredFile, placed: &mut FileGuard) {
        match self.store.delete(record.id).await {
            Ok(_) => warn!(file_id = %record.id, "Commit rolled back"),
            Err(e) => {
                placed.disarm();
                warn!(
                    file_id = %record.id,
                    storage_name = %record.storage_name,
                    error = %e,
                    "Failed to roll back file record"
                );
            }
        }
    }

    /// Render and store a thumbnail. Any failure leaves `record` as is.
    async fn attach_thumbnail(
        &self,
        pipeline: &dyn ThumbnailPipeline,
        record: StoredFile,
        stored: &Path,
    ) -> StoredFile {
        let scratch = match self.paths.resolve_scratch_root().await {
            Ok(scratch) => scratch,
            Err(e) => {
                warn!(file_id = %record.id, error = %e, "No scratch directory for thumbnail");
                return record;
            }
        };
        let temp = scratch.join(format!("{}.thumb", Uuid::new_v4().simple()));
        let _temp_guard = FileGuard::new(&temp);

        if let Err(failure) = pipeline.create(stored, &temp).await {
            debug!(file_id = %record.id, errors = %failure, "Thumbnail not generated");
            return record;
        }

        let bytes = match tokio::fs::read(&temp).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                debug!(file_id = %record.id, "Thumbnail pipeline produced no data");
                return record;
            }
            Err(e) => {
                debug!(file_id = %record.id, error = %e, "Thumbnail output unreadable");
                return record;
            }
        };

        match self.store.update(record.id, &FilePatch::thumbnail(bytes)).await {
            Ok(updated) => updated,
            Err(e) => {
                warn!(file_id = %record.id, error = %e, "Failed to store thumbnail");
                record
            }
        }
    }

    #[cfg(unix)]
    async fn apply_file_mode(&self, path: &Path) -> AppResult<()> {
        use std::os::unix::fs::PermissionsExt;

        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(self.file_mode))
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to set stored file mode", e)
            })
    }

    #[cfg(not(unix))]
    async fn apply_file_mode(&self, _path: &Path) -> AppResult<()> {
        Ok(())
    }
}

/// Rename `source` to `destination`, copying when they sit on different
/// filesystems.
async fn move_into_place(source: &Path, destination: &Path) -> AppResult<()> {
    if tokio::fs::rename(source, destination).await.is_ok() {
        return Ok(());
    }

    if let Err(e) = tokio::fs::copy(source, destination).await {
        let _ = tokio::fs::remove_file(destination).await;
        return Err(AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to move {} into storage", source.display()),
            e,
        ));
    }
    let _ = tokio::fs::remove_file(source).await;
    Ok(())
}
