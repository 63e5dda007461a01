//! Metadata store contract.

use async_trait::async_trait;

use filedock_core::result::AppResult;
use filedock_core::types::{FileId, FileSortField, UserId};
use filedock_entity::file::{FilePatch, NewStoredFile, StoredFile};

/// Persists one record per stored file and the file↔user links.
///
/// Every method is an atomic single-record operation.
#[async_trait]
pub trait MetadataStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a record and return it with its assigned id.
    async fn insert(&self, record: &NewStoredFile) -> AppResult<StoredFile>;

    /// Look up a record.
    async fn find(&self, id: FileId) -> AppResult<Option<StoredFile>>;

    /// Apply a partial update. Fails with `RecordNotFound` for unknown ids.
    async fn update(&self, id: FileId, patch: &FilePatch) -> AppResult<StoredFile>;

    /// Remove a record, returning it if it existed.
    async fn delete(&self, id: FileId) -> AppResult<Option<StoredFile>>;

    /// Every record, ascending by `field`.
    async fn list_ordered_by(&self, field: FileSortField) -> AppResult<Vec<StoredFile>>;

    /// Records associated with `user_id`, ascending by display name.
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<StoredFile>>;

    /// Link a file to a user. Linking twice is not an error.
    async fn add_association(&self, file_id: FileId, user_id: UserId) -> AppResult<()>;
}
