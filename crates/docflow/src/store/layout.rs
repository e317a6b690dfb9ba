use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// On-disk layout shared by intake and the worker:
///
/// ```text
/// <root>/
///   documents_data.json     ledger
///   <doc_id>/<filename>     stored uploads, one directory per document
///   images/                 extracted images, shared, uuid filenames
///   texts/<doc_id>.txt      extracted text, one file per document
/// ```
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Creates the directory tree. Create-if-absent, safe to call repeatedly.
    pub fn init(&self) -> Result<(), StorageError> {
        for dir in [self.root.clone(), self.images_dir(), self.texts_dir()] {
            ensure_directory(&dir)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join("documents_data.json")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    pub fn texts_dir(&self) -> PathBuf {
        self.root.join("texts")
    }

    /// Upload directory for one document.
    pub fn document_dir(&self, doc_id: &str) -> PathBuf {
        self.root.join(doc_id)
    }

    /// Extracted-text file for one document.
    pub fn text_path(&self, doc_id: &str) -> PathBuf {
        self.texts_dir().join(format!("{}.txt", doc_id))
    }

    /// Path of an extracted image by generated filename. Pure join, no
    /// existence check; 404 handling belongs to the file-serving caller.
    pub fn image_path(&self, filename: &str) -> PathBuf {
        self.images_dir().join(filename)
    }
}

pub(crate) fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}
