//! File record operations with capability checks.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use filedock_core::error::AppError;
use filedock_core::result::AppResult;
use filedock_core::types::{AccessLevel, FileId, FileSortField, UserId};
use filedock_database::MetadataStore;
use filedock_entity::file::{FilePatch, StoredFile};
use filedock_storage::StoragePaths;

use super::name::validate_display_name;
use crate::context::RequestContext;

/// Files of one user together with what the viewer may do with them.
#[derive(Debug, Clone, Serialize)]
pub struct UserListing {
    /// The listed files, ascending by display name.
    pub files: Vec<StoredFile>,
    /// Access the viewer has to the listing.
    pub access: AccessLevel,
}

/// Lookup, listing, rename and delete of stored files.
#[derive(Debug, Clone)]
pub struct FileService {
    store: Arc<dyn MetadataStore>,
    paths: StoragePaths,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(store: Arc<dyn MetadataStore>, paths: StoragePaths) -> Self {
        Self { store, paths }
    }

    /// Gets a single file's record.
    pub async fn find(&self, _ctx: &RequestContext, file_id: FileId) -> AppResult<StoredFile> {
        self.store
            .find(file_id)
            .await?
            .ok_or_else(|| AppError::record_not_found(format!("File {file_id} not found")))
    }

    /// Thumbnail bytes of a file, if it has one.
    pub async fn thumbnail(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
    ) -> AppResult<Option<Vec<u8>>> {
        Ok(self.find(ctx, file_id).await?.thumbnail)
    }

    /// Every file, ascending by `sort`. Requires `list`.
    pub async fn list_all(
        &self,
        ctx: &RequestContext,
        sort: FileSortField,
    ) -> AppResult<Vec<StoredFile>> {
        ctx.require_list()?;
        self.store.list_ordered_by(sort).await
    }

    /// Files associated with `user_id`.
    ///
    /// Users always see their own files with manage access. Another user's
    /// files require `list`, and are manageable only with `manage`.
    pub async fn list_for_user(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
    ) -> AppResult<UserListing> {
        let access = if ctx.is_user(user_id) {
            AccessLevel::Manage
        } else {
            ctx.require_list()?;
            if ctx.capabilities.manage {
                AccessLevel::Manage
            } else {
                AccessLevel::Display
            }
        };

        let files = self.store.list_for_user(user_id).await?;
        Ok(UserListing { files, access })
    }

    /// Change a file's display name. Requires `manage`.
    ///
    /// The storage name and the bytes are untouched.
    pub async fn rename(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
        new_name: &str,
    ) -> AppResult<StoredFile> {
        ctx.require_manage()?;
        let name = validate_display_name(new_name)?;
        let file = self.store.update(file_id, &FilePatch::rename(name)).await?;

        info!(file_id = %file_id, display_name = %file.display_name, "File renamed");
        Ok(file)
    }

    /// Remove a file's record, then its bytes. Requires `manage`.
    ///
    /// Failing to unlink the bytes is logged and does not fail the call.
    pub async fn delete(&self, ctx: &RequestContext, file_id: FileId) -> AppResult<StoredFile> {
        ctx.require_manage()?;
        let file = self
            .store
            .delete(file_id)
            .await?
            .ok_or_else(|| AppError::record_not_found(format!("File {file_id} not found")))?;

        let path = file.path_in(self.paths.storage_root());
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(file_id = %file_id, path = %path.display(), "Stored bytes already gone");
            }
            Err(e) => {
                warn!(file_id = %file_id, path = %path.display(), error = %e, "Failed to remove stored bytes");
            }
        }

        info!(file_id = %file_id, storage_name = %file.storage_name, "File deleted");
        Ok(file)
    }
}
