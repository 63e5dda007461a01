//! Metadata store implementations.

pub mod file;
pub mod memory;

pub use file::PgMetadataStore;
pub use memory::MemoryMetadataStore;
