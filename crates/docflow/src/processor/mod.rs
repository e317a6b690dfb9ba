pub mod image;
pub mod office;
pub mod pdf;
pub mod text;

use std::path::Path;

use crate::document::{DocumentFormat, ImageArtifact};
use crate::error::ProcessError;
use crate::store::StorageLayout;

/// What one extraction run produced: the document's text (possibly empty,
/// possibly an error message on a degraded run) and the images pulled out of
/// it, in page order.
#[derive(Debug, Default)]
pub struct ExtractedContent {
    pub text: String,
    pub images: Vec<ImageArtifact>,
}

/// A per-format extraction strategy. Strategies own their failure modes: a
/// bug in one format must never stall the queue, so partial results are
/// returned rather than discarded.
pub trait DocumentProcessor: Send + Sync {
    fn extract(&self, path: &Path, layout: &StorageLayout) -> Result<ExtractedContent, ProcessError>;
    fn supports(&self, format: DocumentFormat) -> bool;
}

/// Routes a file to the strategy for its format. New formats are added by
/// registering a processor, not by branching.
pub struct ProcessorRegistry {
    processors: Vec<Box<dyn DocumentProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        let processors: Vec<Box<dyn DocumentProcessor>> = vec![
            Box::new(text::TextProcessor::new()),
            Box::new(pdf::PdfProcessor::new()),
            Box::new(image::ImageProcessor::new()),
            Box::new(office::OfficeProcessor::new()),
        ];
        Self { processors }
    }

    pub fn extract(
        &self,
        path: &Path,
        layout: &StorageLayout,
    ) -> Result<ExtractedContent, ProcessError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let format = DocumentFormat::from_extension(extension)
            .ok_or_else(|| ProcessError::UnsupportedFormat(extension.to_string()))?;

        for processor in &self.processors {
            if processor.supports(format) {
                return processor.extract(path, layout);
            }
        }

        Err(ProcessError::UnsupportedFormat(extension.to_string()))
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn layout(temp: &TempDir) -> StorageLayout {
        let layout = StorageLayout::new(temp.path().join("data"));
        layout.init().unwrap();
        layout
    }

    #[test]
    fn test_registry_routes_text() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);
        let registry = ProcessorRegistry::new();

        let path = temp.path().join("note.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "routed").unwrap();

        let content = registry.extract(&path, &layout).unwrap();
        assert!(content.text.contains("routed"));
        assert!(content.images.is_empty());
    }

    #[test]
    fn test_registry_routes_office_stub() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);
        let registry = ProcessorRegistry::new();

        let path = temp.path().join("memo.docx");
        std::fs::write(&path, b"not really a docx").unwrap();

        let content = registry.extract(&path, &layout).unwrap();
        assert!(content.text.contains("not implemented"));
    }

    #[test]
    fn test_registry_rejects_unknown_extension() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);
        let registry = ProcessorRegistry::new();

        let path = temp.path().join("tool.exe");
        std::fs::write(&path, b"MZ").unwrap();

        match registry.extract(&path, &layout) {
            Err(ProcessError::UnsupportedFormat(ext)) => assert_eq!(ext, "exe"),
            other => panic!("Expected UnsupportedFormat, got {:?}", other.map(|c| c.text)),
        }
    }

    #[test]
    fn test_registry_rejects_missing_extension() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);
        let registry = ProcessorRegistry::new();

        let path = temp.path().join("bare");
        std::fs::write(&path, b"data").unwrap();

        match registry.extract(&path, &layout) {
            Err(ProcessError::UnsupportedFormat(ext)) => assert_eq!(ext, ""),
            other => panic!("Expected UnsupportedFormat, got {:?}", other.map(|c| c.text)),
        }
    }
}
