//! Thumbnail pipeline configuration.

use serde::{Deserialize, Serialize};

/// Settings for the built-in image thumbnailer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Whether thumbnails are generated after each commit.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Longest edge of a generated thumbnail, in pixels.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_dimension: default_max_dimension(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_max_dimension() -> u32 {
    200
}
