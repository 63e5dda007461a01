//! Chunk staging.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, info};
use uuid::Uuid;

use filedock_core::config::StorageConfig;
use filedock_core::error::AppError;
use filedock_core::result::AppResult;
use filedock_entity::upload::ChunkOutcome;

use super::registry::SessionRegistry;
use crate::paths::{StoragePaths, validate_session_id};

/// Name of the staged file for chunk `index`.
pub fn chunk_file_name(index: u32) -> String {
    format!("{index}.chunk")
}

/// Receives chunks one at a time into per-session staging directories.
#[derive(Debug, Clone)]
pub struct ChunkSink {
    paths: StoragePaths,
    registry: SessionRegistry,
    max_chunks: u32,
    max_upload_bytes: u64,
}

impl ChunkSink {
    /// Create a sink sharing `registry` with the merger and sweeper.
    pub fn new(paths: StoragePaths, registry: SessionRegistry, config: &StorageConfig) -> Self {
        Self {
            paths,
            registry,
            max_chunks: config.max_chunks,
            max_upload_bytes: config.max_upload_size_bytes,
        }
    }

    /// Stage chunk `chunk_index` of `total_chunks` for `session_id`.
    ///
    /// Re-sending an index replaces the staged chunk. Returns
    /// [`ChunkOutcome::Complete`] once every index in `0..total_chunks` is
    /// staged, including for retransmissions after that point.
    pub async fn accept_chunk(
        &self,
        session_id: &str,
        chunk_index: u32,
        total_chunks: u32,
        data: Bytes,
    ) -> AppResult<ChunkOutcome> {
        validate_session_id(session_id)?;
        if total_chunks == 0 || total_chunks > self.max_chunks {
            return Err(AppError::validation(format!(
                "totalChunks must be between 1 and {}",
                self.max_chunks
            )));
        }
        if chunk_index >= total_chunks {
            return Err(AppError::validation(format!(
                "chunkIndex {chunk_index} is out of range for {total_chunks} chunks"
            )));
        }

        let size = data.len() as u64;
        let reservation = self.registry.begin_write(
            session_id,
            chunk_index,
            total_chunks,
            size,
            self.max_upload_bytes,
        )?;

        let dir = self.paths.resolve_chunk_root(session_id).await?;
        write_chunk(&dir, chunk_index, &data).await?;

        let outcome = reservation.finish()?;
        info!(
            session_id,
            chunk_index,
            total_chunks,
            bytes = size,
            complete = outcome.is_complete(),
            "Chunk staged"
        );
        Ok(outcome)
    }
}

/// Write a chunk through a temporary sibling so a concurrent retransmission
/// of the same index never leaves a torn file behind.
async fn write_chunk(dir: &Path, index: u32, data: &[u8]) -> AppResult<PathBuf> {
    let target = dir.join(chunk_file_name(index));
    let tmp = dir.join(format!(
        "{}.tmp-{}",
        chunk_file_name(index),
        Uuid::new_v4().simple()
    ));

    if let Err(e) = tokio::fs::write(&tmp, data).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(AppError::staging_write_failed(&target, e));
    }
    if let Err(e) = tokio::fs::rename(&tmp, &target).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(AppError::staging_write_failed(&target, e));
    }

    debug!(path = %target.display(), bytes = data.len(), "Wrote chunk");
    Ok(target)
}
