//! Core traits defined in `filedock-core` and implemented by other crates.

pub mod thumbnail;

pub use thumbnail::{ThumbnailFailure, ThumbnailPipeline};
