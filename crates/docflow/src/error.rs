use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocflowError {
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

/// Errors surfaced to callers of the intake/query façade.
///
/// The first two variants are validation failures (400-class), `NotFound`
/// maps to 404, `NotReady` is a 400-class condition distinct from
/// `NotFound`, and `Storage` is a 500-class internal failure.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("No file selected")]
    EmptyFilename,

    #[error("File type not allowed. Allowed types: {allowed}")]
    DisallowedExtension { extension: String, allowed: String },

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Text not available yet. Document processing may still be in progress.")]
    NotReady(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker unavailable: {0}")]
    Worker(#[from] WorkerError),
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to process PDF: {0}")]
    PdfProcessing(String),

    #[error("Failed to process image: {0}")]
    ImageProcessing(String),

    #[error("Text extraction failed: {0}")]
    TextExtraction(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to replace ledger '{path}': {source}")]
    ReplaceLedger {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode ledger: {0}")]
    EncodeLedger(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Job queue closed unexpectedly")]
    ChannelClosed,

    #[error("Worker thread panicked")]
    JoinFailed,
}

pub type Result<T> = std::result::Result<T, DocflowError>;
