//! File and chunk storage configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding finished files, named by storage name.
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,
    /// Directory holding one staging subdirectory per in-flight upload session.
    #[serde(default = "default_chunk_root")]
    pub chunk_root: PathBuf,
    /// Directory for merge outputs and thumbnail temporaries.
    #[serde(default = "default_scratch_root")]
    pub scratch_root: PathBuf,
    /// Permission bits applied to directories created by FileDock.
    #[serde(default = "default_dir_mode")]
    pub dir_mode: u32,
    /// Permission bits applied to every committed file.
    #[serde(default = "default_file_mode")]
    pub file_mode: u32,
    /// Maximum size of one upload in bytes (default 5 GB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// Maximum number of chunks a single upload session may declare.
    #[serde(default = "default_max_chunks")]
    pub max_chunks: u32,
    /// Copy buffer used while merging chunks.
    #[serde(default = "default_merge_buffer")]
    pub merge_buffer_bytes: usize,
    /// Idle time after which an unfinished upload session is swept.
    #[serde(default = "default_orphan_ttl")]
    pub orphan_ttl_seconds: u64,
    /// How often the orphan sweeper runs.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_root: default_storage_root(),
            chunk_root: default_chunk_root(),
            scratch_root: default_scratch_root(),
            dir_mode: default_dir_mode(),
            file_mode: default_file_mode(),
            max_upload_size_bytes: default_max_upload(),
            max_chunks: default_max_chunks(),
            merge_buffer_bytes: default_merge_buffer(),
            orphan_ttl_seconds: default_orphan_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl StorageConfig {
    /// Configuration rooted under a single directory, used by tests and
    /// single-volume deployments.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            storage_root: root.join("files"),
            chunk_root: root.join("uploads"),
            scratch_root: root.join("tmp"),
            ..Self::default()
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./data/files")
}

fn default_chunk_root() -> PathBuf {
    PathBuf::from("./data/uploads")
}

fn default_scratch_root() -> PathBuf {
    PathBuf::from("./data/tmp")
}

fn default_dir_mode() -> u32 {
    0o775
}

fn default_file_mode() -> u32 {
    0o664
}

fn default_max_upload() -> u64 {
    5_368_709_120 // 5 GB
}

fn default_max_chunks() -> u32 {
    10_000
}

fn default_merge_buffer() -> usize {
    4096
}

fn default_orphan_ttl() -> u64 {
    86_400
}

fn default_sweep_interval() -> u64 {
    3_600
}
