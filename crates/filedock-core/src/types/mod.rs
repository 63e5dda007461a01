//! Core type definitions used across the FileDock workspace.

pub mod access;
pub mod id;
pub mod sorting;

pub use access::{AccessLevel, Capabilities};
pub use id::*;
pub use sorting::FileSortField;
