//! Contract for the external thumbnail renderer.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;

/// Why a thumbnail could not be produced.
///
/// The messages are for logs only; a failed thumbnail never fails an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThumbnailFailure {
    /// Human-readable reasons, in the order they were encountered.
    pub errors: Vec<String>,
}

impl ThumbnailFailure {
    /// Failure with a single reason.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }

    /// Append another reason.
    pub fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

impl fmt::Display for ThumbnailFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.errors.join(". "))
    }
}

impl std::error::Error for ThumbnailFailure {}

/// Renders a preview image for a stored file.
///
/// On success the implementation must have written the encoded image to
/// `destination`; the caller reads it back and embeds the bytes in the
/// file record.
#[async_trait]
pub trait ThumbnailPipeline: Send + Sync + std::fmt::Debug + 'static {
    /// Render a thumbnail of `source` into `destination`.
    async fn create(&self, source: &Path, destination: &Path) -> Result<(), ThumbnailFailure>;
}
