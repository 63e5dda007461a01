//! Display name rules.

use filedock_core::error::AppError;

/// Longest accepted display name, in characters.
pub const MAX_DISPLAY_NAME_LEN: usize = 255;

/// Display name for a client-supplied filename: the last path component,
/// trimmed.
pub fn display_name_from(client_name: &str) -> Result<String, AppError> {
    let base = client_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(client_name);
    validate_display_name(base)
}

/// Trim and check a display name.
pub fn validate_display_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("File name must not be empty"));
    }
    if name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(AppError::validation(format!(
            "File name must be at most {MAX_DISPLAY_NAME_LEN} characters"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(AppError::validation("File name must not contain control characters"));
    }
    Ok(name.to_string())
}
