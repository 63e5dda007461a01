//! Chunk merging.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{info, warn};
use uuid::Uuid;

use filedock_core::config::StorageConfig;
use filedock_core::error::{AppError, ErrorKind};
use filedock_core::result::AppResult;

use super::registry::SessionRegistry;
use super::sink::chunk_file_name;
use crate::paths::StoragePaths;

/// Concatenates a complete session's chunks into one file in the scratch
/// directory.
#[derive(Debug, Clone)]
pub struct ChunkMerger {
    paths: StoragePaths,
    registry: SessionRegistry,
    buffer_bytes: usize,
}

impl ChunkMerger {
    /// Create a merger sharing `registry` with the sink.
    pub fn new(paths: StoragePaths, registry: SessionRegistry, config: &StorageConfig) -> Self {
        Self {
            paths,
            registry,
            buffer_bytes: config.merge_buffer_bytes.max(1),
        }
    }

    /// Merge every staged chunk of `session_id`, in ascending index order,
    /// and return the path of the assembled file.
    ///
    /// On failure the partial output is removed and the staging directory is
    /// kept so the client can retry. On success the staging directory and
    /// the session are gone.
    pub async fn merge_session(&self, session_id: &str) -> AppResult<PathBuf> {
        let staging = self.paths.session_dir(session_id)?;
        let claim = self.registry.begin_merge(session_id)?;

        let output = self
            .paths
            .resolve_scratch_root()
            .await?
            .join(format!("{session_id}-{}.merged", Uuid::new_v4().simple()));

        let bytes = match self.stream_chunks(&staging, claim.indices(), &output).await {
            Ok(bytes) => bytes,
            Err(e) => {
                remove_partial(&output).await;
                warn!(session_id, error = %e, "Merge failed; staged chunks kept");
                return Err(e);
            }
        };

        match tokio::fs::remove_dir_all(&staging).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                session_id,
                path = %staging.display(),
                error = %e,
                "Failed to remove staging directory"
            ),
        }
        let chunks = claim.indices().len();
        claim.finish();

        info!(
            session_id,
            chunks,
            bytes,
            output = %output.display(),
            "Session merged"
        );
        Ok(output)
    }

    async fn stream_chunks(&self, staging: &Path, indices: &[u32], output: &Path) -> AppResult<u64> {
        let mut out = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(output)
            .await
            .map_err(|e| AppError::output_create_failed(output, e))?;

        let mut buf = vec![0u8; self.buffer_bytes];
        let mut total = 0u64;

        for &index in indices {
            let chunk_path = staging.join(chunk_file_name(index));
            let mut chunk = File::open(&chunk_path)
                .await
                .map_err(|e| AppError::chunk_read_failed(&chunk_path, e))?;

            loop {
                let n = chunk
                    .read(&mut buf)
                    .await
                    .map_err(|e| AppError::chunk_read_failed(&chunk_path, e))?;
                if n == 0 {
                    break;
                }
                out.write_all(&buf[..n])
                    .await
                    .map_err(|e| write_failed(output, e))?;
                total += n as u64;
            }
        }

        out.flush().await.map_err(|e| write_failed(output, e))?;
        out.sync_all().await.map_err(|e| write_failed(output, e))?;
        Ok(total)
    }
}

fn write_failed(output: &Path, source: std::io::Error) -> AppError {
    AppError::with_source(
        ErrorKind::Storage,
        format!("Failed to write merged file {}", output.display()),
        source,
    )
}

async fn remove_partial(output: &Path) {
    match tokio::fs::remove_file(output).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %output.display(), error = %e, "Failed to remove partial merge output"),
    }
}
