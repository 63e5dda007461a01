//! PostgreSQL file repository.

use async_trait::async_trait;
use sqlx::PgPool;

use filedock_core::error::{AppError, ErrorKind};
use filedock_core::result::AppResult;
use filedock_core::types::{FileId, FileSortField, UserId};
use filedock_entity::file::{FilePatch, NewStoredFile, StoredFile};

use crate::store::MetadataStore;

/// Metadata store backed by the `files` and `file_users` tables.
#[derive(Debug, Clone)]
pub struct PgMetadataStore {
    pool: PgPool,
}

impl PgMetadataStore {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    async fn insert(&self, record: &NewStoredFile) -> AppResult<StoredFile> {
        sqlx::query_as::<_, StoredFile>(
            "INSERT INTO files (id, display_name, client_name, storage_name, mime_type, size_bytes) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(FileId::new())
        .bind(&record.display_name)
        .bind(&record.client_name)
        .bind(&record.storage_name)
        .bind(&record.mime_type)
        .bind(record.size_bytes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert file", e))
    }

    async fn find(&self, id: FileId) -> AppResult<Option<StoredFile>> {
        sqlx::query_as::<_, StoredFile>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    async fn update(&self, id: FileId, patch: &FilePatch) -> AppResult<StoredFile> {
        sqlx::query_as::<_, StoredFile>(
            "UPDATE files SET display_name = COALESCE($2, display_name), \
             thumbnail = COALESCE($3, thumbnail), updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(patch.display_name.as_deref())
        .bind(patch.thumbnail.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update file", e))?
        .ok_or_else(|| AppError::record_not_found(format!("File {id} not found")))
    }

    async fn delete(&self, id: FileId) -> AppResult<Option<StoredFile>> {
        sqlx::query_as::<_, StoredFile>("DELETE FROM files WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete file", e))
    }

    async fn list_ordered_by(&self, field: FileSortField) -> AppResult<Vec<StoredFile>> {
        let sql = format!("SELECT * FROM files ORDER BY {} ASC, id ASC", field.column());
        sqlx::query_as::<_, StoredFile>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<StoredFile>> {
        sqlx::query_as::<_, StoredFile>(
            "SELECT f.* FROM files f \
             JOIN file_users fu ON fu.file_id = f.id \
             WHERE fu.user_id = $1 \
             ORDER BY f.display_name ASC, f.id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list files for user", e)
        })
    }

    async fn add_association(&self, file_id: FileId, user_id: UserId) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO file_users (file_id, user_id) VALUES ($1, $2) \
             ON CONFLICT (file_id, user_id) DO NOTHING",
        )
        .bind(file_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to associate file with user", e)
        })?;
        Ok(())
    }
}
