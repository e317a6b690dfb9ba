use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel::Sender;
use serde::Serialize;
use uuid::Uuid;

use crate::document::{
    DocumentFormat, DocumentMetadata, DocumentRecord, DocumentStatus, UploadFields,
    ALLOWED_EXTENSIONS,
};
use crate::error::{Result, ServiceError, StorageError, WorkerError};
use crate::processor::ProcessorRegistry;
use crate::sanitize;
use crate::status::StatusCache;
use crate::store::layout::ensure_directory;
use crate::store::{RecordLedger, StorageLayout};
use crate::worker::{self, QueueMessage, Worker};

/// Service configuration. `public_url` is prepended to status URLs handed
/// back from submit; leave it empty for relative URLs.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub public_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("document_data"),
            public_url: String::new(),
        }
    }
}

/// Shared state behind the façade and the worker: the storage layout, the
/// durable ledger with its in-memory record map, the status cache, and the
/// extraction registry. One instance per process, owned by the service.
pub struct PipelineState {
    pub(crate) layout: StorageLayout,
    pub(crate) ledger: RecordLedger,
    pub(crate) records: Mutex<HashMap<String, DocumentRecord>>,
    pub(crate) status: StatusCache,
    pub(crate) registry: ProcessorRegistry,
}

impl PipelineState {
    /// Every "mutate records then persist the ledger" sequence runs under
    /// this one lock; a stale snapshot can never clobber a concurrent update.
    pub(crate) fn lock_records(&self) -> MutexGuard<'_, HashMap<String, DocumentRecord>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Record map lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitReceipt {
    pub document_id: String,
    pub status_url: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub document_id: String,
    pub status: DocumentStatus,
    pub filename: String,
    pub metadata: DocumentMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextView {
    pub document_id: String,
    pub filename: String,
    pub text_content: String,
}

/// The intake/query façade. Owns the pipeline state and the worker; submit
/// and the query operations run on the caller's thread, extraction runs on
/// the worker's.
pub struct DocumentService {
    state: Arc<PipelineState>,
    sender: Sender<QueueMessage>,
    worker: Option<Worker>,
    public_url: String,
}

impl DocumentService {
    /// Initializes the directory tree, loads the ledger (tolerating a
    /// missing or corrupt file), reconciles terminal statuses into the
    /// cache, and starts the worker.
    pub fn start(config: ServiceConfig) -> Result<Self> {
        let layout = StorageLayout::new(&config.data_dir);
        layout.init()?;

        let ledger = RecordLedger::new(layout.ledger_path());
        let records = ledger.load();

        // Records already in a terminal state read back correctly after a
        // restart; entries lost mid-flight report `unknown` until
        // resubmitted.
        let status = StatusCache::new();
        for (doc_id, record) in &records {
            if record.status.is_terminal() {
                status.set(doc_id, record.status);
            }
        }

        let state = Arc::new(PipelineState {
            layout,
            ledger,
            records: Mutex::new(records),
            status,
            registry: ProcessorRegistry::new(),
        });

        let (sender, receiver) = crossbeam_channel::unbounded();
        let worker = worker::spawn(Arc::clone(&state), receiver);

        log::info!(
            "Document service started (data dir: {})",
            config.data_dir.display()
        );

        Ok(Self {
            state,
            sender,
            worker: Some(worker),
            public_url: config.public_url,
        })
    }

    /// Validates, stores the upload, registers the record, and enqueues the
    /// document. Completes synchronously; a failure leaves no partial record.
    pub fn submit(
        &self,
        content: &[u8],
        filename: &str,
        fields: UploadFields,
    ) -> std::result::Result<SubmitReceipt, ServiceError> {
        if filename.is_empty() {
            return Err(ServiceError::EmptyFilename);
        }
        let extension = sanitize::extension_of(filename);
        if DocumentFormat::from_extension(&extension).is_none() {
            return Err(ServiceError::DisallowedExtension {
                extension,
                allowed: ALLOWED_EXTENSIONS.join(", "),
            });
        }

        let doc_id = Uuid::new_v4().to_string();
        // Routing is by extension; sanitization of a degenerate name can eat
        // it, so reattach the validated one when that happens.
        let mut stored_name = sanitize::sanitize_filename(filename);
        if sanitize::extension_of(&stored_name) != extension {
            stored_name = format!("{}.{}", stored_name, extension);
        }

        let doc_dir = self.state.layout.document_dir(&doc_id);
        ensure_directory(&doc_dir)?;
        let filepath = doc_dir.join(&stored_name);
        std::fs::write(&filepath, content).map_err(|e| StorageError::WriteFile {
            path: filepath.clone(),
            source: e,
        })?;

        let metadata = DocumentMetadata::from_upload(fields, &stored_name);
        let record = DocumentRecord::new(doc_id.clone(), filepath, stored_name, metadata);

        {
            let mut records = self.state.lock_records();
            records.insert(doc_id.clone(), record);
            if let Err(e) = self.state.ledger.save(&records) {
                records.remove(&doc_id);
                return Err(ServiceError::Storage(e));
            }
        }

        self.state.status.set(&doc_id, DocumentStatus::Queued);

        if self.sender.send(QueueMessage::Process(doc_id.clone())).is_err() {
            let mut records = self.state.lock_records();
            records.remove(&doc_id);
            let _ = self.state.ledger.save(&records);
            return Err(ServiceError::Worker(WorkerError::ChannelClosed));
        }

        Ok(SubmitReceipt {
            status_url: format!("{}/document_status/{}", self.public_url, doc_id),
            message: "Document received and queued for processing".to_string(),
            document_id: doc_id,
        })
    }

    /// Current status plus record metadata; extraction results are included
    /// once processing is complete.
    pub fn status(&self, doc_id: &str) -> std::result::Result<StatusView, ServiceError> {
        let records = self.state.lock_records();
        let record = records
            .get(doc_id)
            .ok_or_else(|| ServiceError::NotFound(doc_id.to_string()))?;

        let mut view = StatusView {
            document_id: doc_id.to_string(),
            status: self.state.status.get(doc_id),
            filename: record.filename.clone(),
            metadata: record.metadata.clone(),
            processing_complete: None,
            image_count: None,
            text_available: None,
            images: None,
        };

        if record.processing_complete {
            view.processing_complete = Some(true);
            view.image_count = Some(record.image_count);
            view.text_available = Some(record.text_file.is_some());
            if !record.images.is_empty() {
                view.images = Some(record.images.iter().map(|i| i.filename.clone()).collect());
            }
        }

        Ok(view)
    }

    /// Extracted text for a completed document. `NotReady` (still queued or
    /// processing) is distinct from `NotFound`.
    pub fn text(&self, doc_id: &str) -> std::result::Result<TextView, ServiceError> {
        let (filename, text_file) = {
            let records = self.state.lock_records();
            let record = records
                .get(doc_id)
                .ok_or_else(|| ServiceError::NotFound(doc_id.to_string()))?;

            match (&record.text_file, record.processing_complete) {
                (Some(path), true) => (record.filename.clone(), path.clone()),
                _ => return Err(ServiceError::NotReady(doc_id.to_string())),
            }
        };

        let text_content = std::fs::read_to_string(&text_file).map_err(|e| {
            ServiceError::Storage(StorageError::ReadFile {
                path: text_file.clone(),
                source: e,
            })
        })?;

        Ok(TextView {
            document_id: doc_id.to_string(),
            filename,
            text_content,
        })
    }

    /// Path an extracted image would live at. Pure lookup; existence and
    /// 404 handling belong to the file-serving caller.
    pub fn image_path(&self, filename: &str) -> PathBuf {
        self.state.layout.image_path(filename)
    }

    /// Sends the shutdown sentinel and joins the worker. Documents already
    /// on the queue are drained first.
    pub fn shutdown(mut self) {
        log::info!("Shutting down document service...");
        let _ = self.sender.send(QueueMessage::Shutdown);
        if let Some(worker) = self.worker.take() {
            worker.join();
        }
    }
}
