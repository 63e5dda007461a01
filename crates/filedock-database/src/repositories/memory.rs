//! In-memory metadata store.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use filedock_core::error::AppError;
use filedock_core::result::AppResult;
use filedock_core::types::{FileId, FileSortField, UserId};
use filedock_entity::file::{FilePatch, NewStoredFile, StoredFile};

use crate::store::MetadataStore;

#[derive(Debug, Default)]
struct Tables {
    files: HashMap<FileId, StoredFile>,
    associations: BTreeSet<(UserId, FileId)>,
}

/// Process-local metadata store. Used by tests and the `memory` backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadataStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryMetadataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.tables.read().await.files.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn sort_files(files: &mut [StoredFile], field: FileSortField) {
    match field {
        FileSortField::DisplayName => files.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then(a.id.0.cmp(&b.id.0))
        }),
        FileSortField::CreatedAt => {
            files.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.0.cmp(&b.id.0)))
        }
        FileSortField::SizeBytes => {
            files.sort_by(|a, b| a.size_bytes.cmp(&b.size_bytes).then(a.id.0.cmp(&b.id.0)))
        }
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn insert(&self, record: &NewStoredFile) -> AppResult<StoredFile> {
        let mut tables = self.tables.write().await;
        if tables
            .files
            .values()
            .any(|f| f.storage_name == record.storage_name)
        {
            return Err(AppError::database(format!(
                "Storage name '{}' already recorded",
                record.storage_name
            )));
        }

        let now = Utc::now();
        let file = StoredFile {
            id: FileId::new(),
            display_name: record.display_name.clone(),
            client_name: record.client_name.clone(),
            storage_name: record.storage_name.clone(),
            mime_type: record.mime_type.clone(),
            size_bytes: record.size_bytes,
            thumbnail: None,
            created_at: now,
            updated_at: now,
        };
        tables.files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn find(&self, id: FileId) -> AppResult<Option<StoredFile>> {
        Ok(self.tables.read().await.files.get(&id).cloned())
    }

    async fn update(&self, id: FileId, patch: &FilePatch) -> AppResult<StoredFile> {
        let mut tables = self.tables.write().await;
        let file = tables
            .files
            .get_mut(&id)
            .ok_or_else(|| AppError::record_not_found(format!("File {id} not found")))?;

        if let Some(name) = &patch.display_name {
            file.display_name = name.clone();
        }
        if let Some(thumbnail) = &patch.thumbnail {
            file.thumbnail = Some(thumbnail.clone());
        }
        file.updated_at = Utc::now();
        Ok(file.clone())
    }

    async fn delete(&self, id: FileId) -> AppResult<Option<StoredFile>> {
        let mut tables = self.tables.write().await;
        let removed = tables.files.remove(&id);
        if removed.is_some() {
            tables.associations.retain(|(_, file_id)| *file_id != id);
        }
        Ok(removed)
    }

    async fn list_ordered_by(&self, field: FileSortField) -> AppResult<Vec<StoredFile>> {
        let mut files: Vec<StoredFile> = self.tables.read().await.files.values().cloned().collect();
        sort_files(&mut files, field);
        Ok(files)
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<StoredFile>> {
        let tables = self.tables.read().await;
        let mut files: Vec<StoredFile> = tables
            .associations
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .filter_map(|(_, file_id)| tables.files.get(file_id).cloned())
            .collect();
        sort_files(&mut files, FileSortField::DisplayName);
        Ok(files)
    }

    async fn add_association(&self, file_id: FileId, user_id: UserId) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.files.contains_key(&file_id) {
            return Err(AppError::record_not_found(format!("File {file_id} not found")));
        }
        tables.associations.insert((user_id, file_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use filedock_core::error::ErrorKind;

    use super::*;

    fn new_file(display_name: &str, storage_name: &str, size: i64) -> NewStoredFile {
        NewStoredFile {
            display_name: display_name.into(),
            client_name: display_name.into(),
            storage_name: storage_name.into(),
            mime_type: "application/octet-stream".into(),
            size_bytes: size,
        }
    }

    #[tokio::test]
    async fn test_insert_find_delete() {
        let store = MemoryMetadataStore::new();
        let file = store.insert(&new_file("a.bin", "x.bin", 3)).await.unwrap();

        let found = store.find(file.id).await.unwrap().expect("present");
        assert_eq!(found.display_name, "a.bin");
        assert!(found.thumbnail.is_none());

        let removed = store.delete(file.id).await.unwrap();
        assert_eq!(removed.map(|f| f.id), Some(file.id));
        assert!(store.find(file.id).await.unwrap().is_none());
        assert!(store.delete(file.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_patches_only_given_fields() {
        let store = MemoryMetadataStore::new();
        let file = store.insert(&new_file("a.bin", "x.bin", 3)).await.unwrap();

        let updated = store
            .update(file.id, &FilePatch::thumbnail(vec![1, 2, 3]))
            .await
            .unwrap();
        assert_eq!(updated.display_name, "a.bin");
        assert_eq!(updated.thumbnail.as_deref(), Some(&[1u8, 2, 3][..]));

        let renamed = store.update(file.id, &FilePatch::rename("b.bin")).await.unwrap();
        assert_eq!(renamed.display_name, "b.bin");
        assert_eq!(renamed.storage_name, "x.bin");
        assert!(renamed.has_thumbnail());
    }

    #[tokio::test]
    async fn test_update_unknown_is_record_not_found() {
        let store = MemoryMetadataStore::new();
        let err = store
            .update(FileId::new(), &FilePatch::rename("x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::RecordNotFound);
    }

    #[tokio::test]
    async fn test_list_orders_and_filters_by_user() {
        let store = MemoryMetadataStore::new();
        let big = store.insert(&new_file("b", "1", 30)).await.unwrap();
        let small = store.insert(&new_file("c", "2", 10)).await.unwrap();
        let mid = store.insert(&new_file("a", "3", 20)).await.unwrap();

        let by_name: Vec<_> = store
            .list_ordered_by(FileSortField::DisplayName)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(by_name, vec![mid.id, big.id, small.id]);

        let by_size: Vec<_> = store
            .list_ordered_by(FileSortField::SizeBytes)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(by_size, vec![small.id, mid.id, big.id]);

        let user = UserId::new();
        store.add_association(small.id, user).await.unwrap();
        store.add_association(small.id, user).await.unwrap();
        store.add_association(mid.id, user).await.unwrap();
        let mine: Vec<_> = store
            .list_for_user(user)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(mine, vec![mid.id, small.id]);

        store.delete(mid.id).await.unwrap();
        assert_eq!(store.list_for_user(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_storage_name_rejected() {
        let store = MemoryMetadataStore::new();
        store.insert(&new_file("a", "same.bin", 1)).await.unwrap();
        let err = store.insert(&new_file("b", "same.bin", 1)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Database);
    }
}
