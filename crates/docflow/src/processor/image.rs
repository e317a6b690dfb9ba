use std::path::Path;

use uuid::Uuid;

use crate::document::{DocumentFormat, ImageArtifact};
use crate::error::ProcessError;
use crate::processor::{DocumentProcessor, ExtractedContent};
use crate::store::StorageLayout;

/// Raster uploads are re-encoded into a normalized PNG in the shared images
/// directory and recorded as a single page-1 artifact. No OCR: the text body
/// is a placeholder naming the original file.
pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for ImageProcessor {
    fn extract(
        &self,
        path: &Path,
        layout: &StorageLayout,
    ) -> Result<ExtractedContent, ProcessError> {
        let _span = tracing::info_span!("processor.image").entered();

        let original = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();

        // Decode/encode failures degrade to an error-message text body; the
        // record still completes and the queue keeps moving.
        match normalize_to_png(path, layout) {
            Ok(artifact) => Ok(ExtractedContent {
                text: format!("[Image file: {}]", original),
                images: vec![artifact],
            }),
            Err(e) => {
                tracing::warn!("Image extraction failed for {}: {}", path.display(), e);
                Ok(ExtractedContent {
                    text: format!("Error processing image: {}", e),
                    images: Vec::new(),
                })
            }
        }
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Image)
    }
}

fn normalize_to_png(path: &Path, layout: &StorageLayout) -> Result<ImageArtifact, ProcessError> {
    let img = image::open(path)
        .map_err(|e| ProcessError::ImageProcessing(format!("Failed to load image: {}", e)))?;

    let filename = format!("{}.png", Uuid::new_v4());
    let out_path = layout.image_path(&filename);
    img.save_with_format(&out_path, image::ImageFormat::Png)
        .map_err(|e| ProcessError::ImageProcessing(format!("Failed to write PNG: {}", e)))?;

    Ok(ImageArtifact {
        path: out_path,
        page: 1,
        filename,
    })
}
