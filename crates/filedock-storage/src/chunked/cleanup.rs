//! Orphan chunk cleanup.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{TimeDelta, Utc};
use tracing::{debug, info, warn};

use filedock_core::error::{AppError, ErrorKind};
use filedock_core::result::AppResult;

use super::registry::SessionRegistry;
use crate::paths::StoragePaths;

/// What one sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Idle sessions dropped from the registry.
    pub evicted_sessions: usize,
    /// Staging directories removed from disk.
    pub removed_dirs: usize,
    /// Leftover merge outputs removed from the scratch directory.
    pub removed_scratch_files: usize,
}

/// Reclaims staging state of abandoned uploads.
#[derive(Debug, Clone)]
pub struct OrphanChunkCleanup {
    paths: StoragePaths,
    registry: SessionRegistry,
    ttl: Duration,
}

impl OrphanChunkCleanup {
    /// Create a sweeper treating anything idle for longer than `ttl` as
    /// abandoned.
    pub fn new(paths: StoragePaths, registry: SessionRegistry, ttl: Duration) -> Self {
        Self {
            paths,
            registry,
            ttl,
        }
    }

    /// Run one sweep.
    pub async fn sweep(&self) -> AppResult<SweepReport> {
        let mut report = SweepReport::default();

        let ttl = TimeDelta::from_std(self.ttl).unwrap_or(TimeDelta::MAX);
        let cutoff = Utc::now()
            .checked_sub_signed(ttl)
            .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);

        for session_id in self.registry.evict_idle(cutoff) {
            report.evicted_sessions += 1;
            let dir = self.paths.session_dir(&session_id)?;
            if remove_dir(&dir).await {
                report.removed_dirs += 1;
            }
            debug!(session_id = %session_id, "Evicted idle upload session");
        }

        // Staging directories unknown to the registry, e.g. left by a
        // previous process.
        for (name, path) in self.stale_entries(self.paths.chunk_root(), true).await? {
            if self.registry.contains(&name) {
                continue;
            }
            if remove_dir(&path).await {
                report.removed_dirs += 1;
            }
        }

        for (_, path) in self.stale_entries(self.paths.scratch_root(), false).await? {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => report.removed_scratch_files += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove scratch file"),
            }
        }

        if report != SweepReport::default() {
            info!(
                evicted_sessions = report.evicted_sessions,
                removed_dirs = report.removed_dirs,
                removed_scratch_files = report.removed_scratch_files,
                "Orphan chunk sweep finished"
            );
        }
        Ok(report)
    }

    /// Entries of `root` (directories or files) last modified more than
    /// `ttl` ago.
    async fn stale_entries(&self, root: &Path, dirs: bool) -> AppResult<Vec<(String, PathBuf)>> {
        let mut entries = match tokio::fs::read_dir(root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to list {}", root.display()),
                    e,
                ));
            }
        };

        let now = SystemTime::now();
        let mut stale = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to list {}", root.display()), e)
        })? {
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if meta.is_dir() != dirs {
                continue;
            }
            let age = meta
                .modified()
                .ok()
                .and_then(|m| now.duration_since(m).ok())
                .unwrap_or_default();
            if age > self.ttl {
                let name = entry.file_name().to_string_lossy().into_owned();
                stale.push((name, entry.path()));
            }
        }
        Ok(stale)
    }
}

async fn remove_dir(path: &Path) -> bool {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to remove staging directory");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use filedock_core::config::StorageConfig;

    use super::*;
    use crate::chunked::ChunkSink;

    #[tokio::test]
    async fn test_zero_ttl_sweeps_idle_sessions_and_strays() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StorageConfig::rooted_at(tmp.path());
        let paths = StoragePaths::from_config(&config);
        let registry = SessionRegistry::new();
        let sink = ChunkSink::new(paths.clone(), registry.clone(), &config);

        sink.accept_chunk("abandoned", 0, 2, Bytes::from_static(b"x"))
            .await
            .unwrap();
        std::fs::create_dir_all(config.chunk_root.join("from-last-run")).unwrap();
        std::fs::create_dir_all(&config.scratch_root).unwrap();
        std::fs::write(config.scratch_root.join("old.merged"), b"partial").unwrap();

        // Let the mtimes fall strictly behind "now".
        tokio::time::sleep(Duration::from_millis(20)).await;

        let cleanup = OrphanChunkCleanup::new(paths, registry.clone(), Duration::ZERO);
        let report = cleanup.sweep().await.unwrap();

        assert_eq!(report.evicted_sessions, 1);
        assert_eq!(report.removed_dirs, 2);
        assert_eq!(report.removed_scratch_files, 1);
        assert!(registry.is_empty());
        assert!(!config.chunk_root.join("abandoned").exists());
        assert!(!config.chunk_root.join("from-last-run").exists());
    }

    #[tokio::test]
    async fn test_fresh_sessions_survive() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StorageConfig::rooted_at(tmp.path());
        let paths = StoragePaths::from_config(&config);
        let registry = SessionRegistry::new();
        let sink = ChunkSink::new(paths.clone(), registry.clone(), &config);
        sink.accept_chunk("live", 0, 2, Bytes::from_static(b"x"))
            .await
            .unwrap();

        let cleanup = OrphanChunkCleanup::new(paths, registry.clone(), Duration::from_secs(3600));
        assert_eq!(cleanup.sweep().await.unwrap(), SweepReport::default());
        assert!(registry.contains("live"));
        assert!(config.chunk_root.join("live").join("0.chunk").exists());
    }

    #[tokio::test]
    async fn test_missing_roots_are_fine() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StorageConfig::rooted_at(tmp.path().join("nowhere"));
        let cleanup = OrphanChunkCleanup::new(
            StoragePaths::from_config(&config),
            SessionRegistry::new(),
            Duration::ZERO,
        );
        assert_eq!(cleanup.sweep().await.unwrap(), SweepReport::default());
    }
}
