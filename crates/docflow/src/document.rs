use std::fmt;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Upload extensions accepted by intake. Anything else is rejected before a
/// record is created.
pub const ALLOWED_EXTENSIONS: [&str; 7] = ["pdf", "doc", "docx", "txt", "png", "jpg", "jpeg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Office,
    Image,
    Text,
}

impl DocumentFormat {
    /// Maps a file extension (case-insensitive) to its extraction format.
    /// Returns `None` for anything outside the allow-list.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "doc" | "docx" => Some(Self::Office),
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Lifecycle state of a document. Transitions are monotonic:
/// `Queued -> Processing -> {Completed | Error}`. `Unknown` is only ever
/// produced by a status-cache miss and is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Queued,
    Processing,
    Completed,
    Error,
    Unknown,
}

impl DocumentStatus {
    /// Returns true for states no worker will move the document out of.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Caller-supplied descriptive fields. None of these are validated beyond
/// presence; `upload_date` is stamped at intake.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub upload_date: String,
}

/// Form fields accepted alongside an upload. Title defaults to the stored
/// filename when empty.
#[derive(Debug, Clone, Default)]
pub struct UploadFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: Option<String>,
    pub user_id: Option<String>,
}

impl DocumentMetadata {
    pub fn from_upload(fields: UploadFields, filename: &str) -> Self {
        Self {
            title: fields.title.filter(|t| !t.is_empty()).unwrap_or_else(|| filename.to_string()),
            description: fields.description.unwrap_or_default(),
            category: fields.category.unwrap_or_default(),
            tags: fields.tags.unwrap_or_default(),
            user_id: fields.user_id.unwrap_or_default(),
            upload_date: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// An image pulled out of a document during extraction. Lives in the shared
/// images directory and belongs to exactly one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageArtifact {
    pub path: PathBuf,
    /// 1-indexed page the image came from.
    pub page: u32,
    /// Generated filename inside the shared images directory.
    pub filename: String,
}

/// One entry in the record ledger. The id is immutable once assigned;
/// `processing_complete == true` implies `status == Completed` and a
/// recorded text file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub doc_id: String,
    pub filepath: PathBuf,
    pub filename: String,
    pub metadata: DocumentMetadata,
    pub processing_complete: bool,
    pub status: DocumentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_file: Option<PathBuf>,
    #[serde(default)]
    pub image_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageArtifact>,
}

impl DocumentRecord {
    /// Creates the intake-time record: queued, nothing extracted yet.
    pub fn new(doc_id: String, filepath: PathBuf, filename: String, metadata: DocumentMetadata) -> Self {
        Self {
            doc_id,
            filepath,
            filename,
            metadata,
            processing_complete: false,
            status: DocumentStatus::Queued,
            text_file: None,
            image_count: 0,
            images: Vec::new(),
        }
    }

    /// Extension of the stored upload, lowercased. Empty when absent.
    pub fn extension(&self) -> String {
        self.filepath
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
    }
}
