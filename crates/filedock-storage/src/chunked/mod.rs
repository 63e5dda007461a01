//! Chunked upload handling.
//!
//! The [`ChunkSink`], [`ChunkMerger`] and [`OrphanChunkCleanup`] of one
//! process share a single [`SessionRegistry`].

pub mod cleanup;
pub mod merger;
pub mod registry;
pub mod sink;

pub use cleanup::{OrphanChunkCleanup, SweepReport};
pub use merger::ChunkMerger;
pub use registry::SessionRegistry;
pub use sink::ChunkSink;
