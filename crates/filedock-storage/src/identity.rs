//! Server-side file identity.
//!
//! Stored bytes are addressed by a random storage name, never by the name
//! the client supplied.

use std::path::Path;

use uuid::Uuid;

use filedock_core::error::{AppError, ErrorKind};
use filedock_core::result::AppResult;

/// Longest extension carried over from a client filename.
const MAX_EXTENSION_LEN: usize = 16;

/// Attempts before giving up on finding an unused name.
const MAX_ATTEMPTS: usize = 8;

/// Random storage name, keeping the extension of `original_name` if it has
/// a usable one.
pub fn new_storage_name(original_name: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    match extension_of(original_name) {
        Some(ext) => format!("{token}.{ext}"),
        None => token,
    }
}

/// Lowercased extension of a client filename.
///
/// Returns `None` when the name has no extension or the extension contains
/// anything other than ASCII letters and digits.
pub fn extension_of(original_name: &str) -> Option<String> {
    // Clients on Windows send backslash-separated paths.
    let base = original_name.rsplit(['/', '\\']).next().unwrap_or(original_name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > MAX_EXTENSION_LEN {
        return None;
    }
    if !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// A storage name not yet present under `storage_root`.
pub async fn unused_storage_name(storage_root: &Path, original_name: &str) -> AppResult<String> {
    for _ in 0..MAX_ATTEMPTS {
        let name = new_storage_name(original_name);
        let taken = tokio::fs::try_exists(storage_root.join(&name))
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to check storage name", e)
            })?;
        if !taken {
            return Ok(name);
        }
        tracing::debug!(name = %name, "Storage name collision, re-rolling");
    }
    Err(AppError::storage("Could not find an unused storage name"))
}
