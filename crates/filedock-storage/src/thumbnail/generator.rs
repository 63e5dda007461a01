//! Thumbnail generator for image files.

use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, ImageReader};

use filedock_core::config::ThumbnailConfig;
use filedock_core::traits::thumbnail::{ThumbnailFailure, ThumbnailPipeline};

/// Renders JPEG thumbnails of images with the `image` crate.
#[derive(Debug, Clone)]
pub struct ImageThumbnailer {
    /// Longest edge of the produced thumbnail.
    max_dimension: u32,
}

impl ImageThumbnailer {
    /// Create a thumbnailer bounded by `max_dimension` pixels per edge.
    pub fn new(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }

    /// Create a thumbnailer from configuration.
    pub fn from_config(config: &ThumbnailConfig) -> Self {
        Self::new(config.max_dimension)
    }

    /// Decode `source`, scale it to fit, and encode it as JPEG.
    ///
    /// The reader streams from disk; only the decoded image is held in
    /// memory.
    fn render(source: &Path, max_dimension: u32) -> Result<Vec<u8>, ThumbnailFailure> {
        let img = ImageReader::open(source)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| {
                ThumbnailFailure::new(format!("Failed to read {}: {e}", source.display()))
            })?;
        if img.format().is_none() {
            return Err(ThumbnailFailure::new("File is not a recognized image format"));
        }
        let img = img
            .decode()
            .map_err(|e| ThumbnailFailure::new(format!("Failed to decode image: {e}")))?;

        // JPEG carries no alpha channel.
        let thumb = DynamicImage::ImageRgb8(img.thumbnail(max_dimension, max_dimension).to_rgb8());

        let mut buf = Vec::new();
        thumb
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .map_err(|e| ThumbnailFailure::new(format!("Failed to encode thumbnail: {e}")))?;
        Ok(buf)
    }
}

#[async_trait]
impl ThumbnailPipeline for ImageThumbnailer {
    async fn create(&self, source: &Path, destination: &Path) -> Result<(), ThumbnailFailure> {
        let path = source.to_path_buf();
        let max_dimension = self.max_dimension;
        let jpeg = tokio::task::spawn_blocking(move || Self::render(&path, max_dimension))
            .await
            .map_err(|e| ThumbnailFailure::new(format!("Thumbnail task panicked: {e}")))??;

        tokio::fs::write(destination, &jpeg).await.map_err(|e| {
            let mut failure = ThumbnailFailure::new("Failed to write thumbnail");
            failure.push(format!("{}: {e}", destination.display()));
            failure
        })?;

        tracing::debug!(
            source = %source.display(),
            bytes = jpeg.len(),
            "Generated thumbnail"
        );
        Ok(())
    }
}
