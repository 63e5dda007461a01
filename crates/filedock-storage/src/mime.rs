//! Content type detection for stored files.

use std::path::Path;

use tokio::io::AsyncReadExt;

use filedock_core::error::{AppError, ErrorKind};
use filedock_core::result::AppResult;

/// Bytes sniffed from the start of a file.
const SNIFF_LEN: usize = 8192;

/// Fallback for content nothing else recognizes.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Detect the MIME type of the file at `path` from its content, falling
/// back to its extension.
pub async fn detect_mime(path: &Path) -> AppResult<String> {
    let mut file = tokio::fs::File::open(path).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to open {} for type detection", path.display()),
            e,
        )
    })?;

    let mut head = Vec::with_capacity(SNIFF_LEN);
    (&mut file)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read {} for type detection", path.display()),
                e,
            )
        })?;

    Ok(detect_from_head(&head, path))
}

/// Classify a file from its leading bytes and name.
///
/// Order: magic bytes, then extension, then UTF-8 text.
pub fn detect_from_head(head: &[u8], path: &Path) -> String {
    if let Some(kind) = infer::get(head) {
        return kind.mime_type().to_string();
    }
    if let Some(guess) = mime_guess::from_path(path).first() {
        return guess.essence_str().to_string();
    }
    if looks_like_text(head) {
        return "text/plain".to_string();
    }
    OCTET_STREAM.to_string()
}

fn looks_like_text(head: &[u8]) -> bool {
    if head.is_empty() || head.contains(&0) {
        return false;
    }
    match std::str::from_utf8(head) {
        Ok(_) => true,
        // The sniff window may cut a multi-byte character in half.
        Err(e) => e.error_len().is_none(),
    }
}
