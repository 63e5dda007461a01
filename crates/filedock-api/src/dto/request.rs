//! Request DTOs with validation.

use serde::Deserialize;
use validator::Validate;

/// Rename a file.
#[derive(Debug, Deserialize, Validate)]
pub struct RenameFileRequest {
    /// New display name.
    #[validate(length(min = 1, max = 255))]
    pub display_name: String,
}

/// Query string of the file listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListFilesQuery {
    /// Field to order by (`display_name`, `created_at`, `size_bytes`).
    pub sort: Option<String>,
}
