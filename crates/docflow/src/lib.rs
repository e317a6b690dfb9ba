pub mod document;
pub mod error;
pub mod processor;
pub mod sanitize;
pub mod service;
pub mod status;
pub mod store;
pub mod worker;

pub use document::{
    DocumentFormat, DocumentMetadata, DocumentRecord, DocumentStatus, ImageArtifact, UploadFields,
    ALLOWED_EXTENSIONS,
};
pub use error::{DocflowError, ProcessError, Result, ServiceError, StorageError, WorkerError};
pub use processor::{DocumentProcessor, ExtractedContent, ProcessorRegistry};
pub use service::{DocumentService, ServiceConfig, StatusView, SubmitReceipt, TextView};
pub use status::StatusCache;
pub use store::{RecordLedger, StorageLayout};
pub use worker::QueueMessage;
