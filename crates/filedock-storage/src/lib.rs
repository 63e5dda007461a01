//! # filedock-storage
//!
//! Filesystem side of FileDock: directory resolution, storage names,
//! content type detection, chunk staging and merging, orphan cleanup, and
//! the default image thumbnailer.

pub mod chunked;
pub mod identity;
pub mod mime;
pub mod paths;
pub mod thumbnail;

pub use chunked::{ChunkMerger, ChunkSink, OrphanChunkCleanup, SessionRegistry};
pub use paths::StoragePaths;
pub use thumbnail::ImageThumbnailer;
