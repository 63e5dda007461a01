//! File upload service: whole-file and chunked upload flows.

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use filedock_core::config::StorageConfig;
use filedock_core::error::{AppError, ErrorKind};
use filedock_core::result::AppResult;
use filedock_entity::file::StoredFile;
use filedock_entity::upload::ChunkOutcome;
use filedock_storage::{ChunkMerger, ChunkSink, StoragePaths};

use super::name::display_name_from;
use super::record::FileRecordBuilder;
use crate::context::RequestContext;

/// One chunk as received from the client.
#[derive(Debug, Clone)]
pub struct ChunkUpload {
    /// Client-chosen upload session id.
    pub session_id: String,
    /// 0-based chunk index.
    pub chunk_index: u32,
    /// Number of chunks in the upload.
    pub total_chunks: u32,
    /// Client filename of the whole upload.
    pub file_name: String,
    /// Chunk bytes.
    pub data: Bytes,
}

/// Result of handing a chunk to the upload service.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadOutcome {
    /// More chunks are needed.
    Pending {
        /// Distinct chunks staged so far.
        received: u32,
        /// Chunks the upload consists of.
        total: u32,
    },
    /// Every chunk is staged and another request for the same session is
    /// assembling the file.
    Merging {
        /// Chunks the upload consists of.
        total: u32,
    },
    /// The upload is assembled and recorded.
    Stored {
        /// The new record.
        file: StoredFile,
    },
}

/// Handles both whole-file and chunked uploads.
#[derive(Debug, Clone)]
pub struct UploadService {
    sink: ChunkSink,
    merger: ChunkMerger,
    builder: FileRecordBuilder,
    paths: StoragePaths,
    max_upload_bytes: u64,
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(
        sink: ChunkSink,
        merger: ChunkMerger,
        builder: FileRecordBuilder,
        paths: StoragePaths,
        config: &StorageConfig,
    ) -> Self {
        Self {
            sink,
            merger,
            builder,
            paths,
            max_upload_bytes: config.max_upload_size_bytes,
        }
    }

    /// Stage one chunk. The chunk completing the set triggers the merge and
    /// commit, and the stored record is returned.
    ///
    /// The file name is checked before anything is staged. When a
    /// concurrent request completing the same set wins the merge, this one
    /// reports [`UploadOutcome::Merging`].
    pub async fn accept_chunk(
        &self,
        ctx: &RequestContext,
        upload: ChunkUpload,
    ) -> AppResult<UploadOutcome> {
        display_name_from(&upload.file_name)?;

        let outcome = self
            .sink
            .accept_chunk(
                &upload.session_id,
                upload.chunk_index,
                upload.total_chunks,
                upload.data,
            )
            .await?;

        match outcome {
            ChunkOutcome::Pending { received, expected } => Ok(UploadOutcome::Pending {
                received,
                total: expected,
            }),
            ChunkOutcome::Complete => {
                let assembled = match self.merger.merge_session(&upload.session_id).await {
                    Ok(assembled) => assembled,
                    Err(e) if lost_merge_race(&e) => {
                        debug!(
                            session_id = %upload.session_id,
                            "Session is being merged by another request"
                        );
                        return Ok(UploadOutcome::Merging {
                            total: upload.total_chunks,
                        });
                    }
                    Err(e) => return Err(e),
                };
                let file = self
                    .builder
                    .commit(&assembled, &upload.file_name, ctx.user_id)
                    .await?;
                info!(
                    session_id = %upload.session_id,
                    file_id = %file.id,
                    chunks = upload.total_chunks,
                    "Chunked upload completed"
                );
                Ok(UploadOutcome::Stored { file })
            }
        }
    }

    /// Store a file sent in a single request.
    pub async fn upload_whole(
        &self,
        ctx: &RequestContext,
        file_name: &str,
        data: Bytes,
    ) -> AppResult<StoredFile> {
        if data.len() as u64 > self.max_upload_bytes {
            return Err(AppError::validation(format!(
                "File exceeds maximum upload size of {} bytes",
                self.max_upload_bytes
            )));
        }

        let scratch = self.paths.resolve_scratch_root().await?;
        let temp = scratch.join(format!("{}.upload", Uuid::new_v4().simple()));
        if let Err(e) = tokio::fs::write(&temp, &data).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(AppError::with_source(
                ErrorKind::Storage,
                "Failed to buffer upload",
                e,
            ));
        }

        let file = self.builder.commit(&temp, file_name, ctx.user_id).await?;
        info!(
            file_id = %file.id,
            size = file.size_bytes,
            "Simple upload completed"
        );
        Ok(file)
    }
}

/// After a complete chunk, these errors mean another request claimed the
/// merge first (or already finished it).
fn lost_merge_race(err: &AppError) -> bool {
    matches!(err.kind, ErrorKind::MergeInProgress | ErrorKind::NoChunksFound)
}
