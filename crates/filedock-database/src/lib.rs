//! # filedock-database
//!
//! The [`MetadataStore`] contract plus its PostgreSQL and in-memory
//! implementations, connection pool management, and migrations.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use repositories::{MemoryMetadataStore, PgMetadataStore};
pub use store::MetadataStore;
