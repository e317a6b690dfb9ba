use std::path::Path;

use crate::document::DocumentFormat;
use crate::error::ProcessError;
use crate::processor::{DocumentProcessor, ExtractedContent};
use crate::store::StorageLayout;

pub struct TextProcessor;

impl TextProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for TextProcessor {
    fn extract(
        &self,
        path: &Path,
        _layout: &StorageLayout,
    ) -> Result<ExtractedContent, ProcessError> {
        // Lossy decode: undecodable bytes become replacement characters
        // instead of failing the document.
        let bytes = std::fs::read(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;
        let text = String::from_utf8_lossy(&bytes).into_owned();

        Ok(ExtractedContent {
            text,
            images: Vec::new(),
        })
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Text)
    }
}
