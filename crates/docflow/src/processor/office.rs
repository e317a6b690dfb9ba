use std::path::Path;

use crate::document::DocumentFormat;
use crate::error::ProcessError;
use crate::processor::{DocumentProcessor, ExtractedContent};
use crate::store::StorageLayout;

/// Placeholder strategy for `doc`/`docx`. Real extraction is intentionally
/// unimplemented; the record still completes with an explanatory text body so
/// these uploads are accepted rather than rejected.
pub struct OfficeProcessor;

impl OfficeProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OfficeProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for OfficeProcessor {
    fn extract(
        &self,
        path: &Path,
        _layout: &StorageLayout,
    ) -> Result<ExtractedContent, ProcessError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("doc")
            .to_lowercase();

        Ok(ExtractedContent {
            text: format!("Document processing for {} files not implemented yet", extension),
            images: Vec::new(),
        })
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Office)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_placeholder_names_the_extension() {
        let temp = TempDir::new().unwrap();
        let layout = StorageLayout::new(temp.path().join("data"));
        layout.init().unwrap();

        let processor = OfficeProcessor::new();
        let content = processor
            .extract(Path::new("/uploads/contract.docx"), &layout)
            .unwrap();
        assert_eq!(
            content.text,
            "Document processing for docx files not implemented yet"
        );
        assert!(content.images.is_empty());
    }

    #[test]
    fn test_supports_only_office() {
        let processor = OfficeProcessor::new();
        assert!(processor.supports(DocumentFormat::Office));
        assert!(!processor.supports(DocumentFormat::Pdf));
        assert!(!processor.supports(DocumentFormat::Text));
        assert!(!processor.supports(DocumentFormat::Image));
    }
}
