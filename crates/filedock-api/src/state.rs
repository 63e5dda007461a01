//! Shared application state passed to every handler.

use std::sync::Arc;

use filedock_core::config::AppConfig;
use filedock_service::{FileService, UploadService};

/// State available to handlers through Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Upload intake.
    pub upload_service: Arc<UploadService>,
    /// Record lookup and management.
    pub file_service: Arc<FileService>,
}
