use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;

use crate::document::{DocumentRecord, DocumentStatus};
use crate::error::{DocflowError, StorageError};
use crate::service::PipelineState;
use crate::store::layout::ensure_directory;

/// Messages on the job queue. `Shutdown` is the sentinel, distinct from any
/// real document id, that makes the worker exit its loop cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueMessage {
    Process(String),
    Shutdown,
}

pub(crate) struct Worker {
    handle: JoinHandle<()>,
}

impl Worker {
    pub(crate) fn join(self) {
        if self.handle.join().is_err() {
            log::error!("Worker thread panicked");
        }
    }
}

/// Starts the single long-lived worker thread consuming from `receiver`.
pub(crate) fn spawn(state: Arc<PipelineState>, receiver: Receiver<QueueMessage>) -> Worker {
    let handle = thread::spawn(move || run_worker(state, receiver));
    Worker { handle }
}

fn run_worker(state: Arc<PipelineState>, receiver: Receiver<QueueMessage>) {
    log::info!("Document processing worker started");

    loop {
        match receiver.recv() {
            Ok(QueueMessage::Process(doc_id)) => process_document(&state, &doc_id),
            Ok(QueueMessage::Shutdown) => {
                log::debug!("Worker received shutdown signal");
                break;
            }
            Err(_) => {
                log::debug!("Job channel disconnected");
                break;
            }
        }
    }

    log::info!("Document processing worker stopped");
}

/// One document, one boundary: any failure in here becomes an `error` status
/// in the cache and the loop moves on to the next id.
fn process_document(state: &PipelineState, doc_id: &str) {
    state.status.set(doc_id, DocumentStatus::Processing);

    let record = state.lock_records().get(doc_id).cloned();
    let Some(record) = record else {
        log::error!("No record found for document {}", doc_id);
        state.status.set(doc_id, DocumentStatus::Error);
        return;
    };

    match extract_and_store(state, &record) {
        Ok(()) => {
            state.status.set(doc_id, DocumentStatus::Completed);
            log::info!("Document {} processed successfully", doc_id);
        }
        Err(e) => {
            log::error!("Error processing document {}: {}", doc_id, e);
            state.status.set(doc_id, DocumentStatus::Error);
        }
    }
}

fn extract_and_store(state: &PipelineState, record: &DocumentRecord) -> Result<(), DocflowError> {
    ensure_directory(&state.layout.document_dir(&record.doc_id))?;

    let content = state.registry.extract(&record.filepath, &state.layout)?;

    let text_path = state.layout.text_path(&record.doc_id);
    std::fs::write(&text_path, content.text.as_bytes()).map_err(|e| StorageError::WriteFile {
        path: text_path.clone(),
        source: e,
    })?;

    // Mutate and persist under one lock acquisition so a concurrent submit
    // can never snapshot the ledger between the two.
    let mut records = state.lock_records();
    if let Some(stored) = records.get_mut(&record.doc_id) {
        stored.text_file = Some(text_path);
        stored.image_count = content.images.len();
        stored.images = content.images;
        stored.processing_complete = true;
        stored.status = DocumentStatus::Completed;
    }
    if let Err(e) = state.ledger.save(&records) {
        // Durability is lost for this mutation but the in-memory record
        // stays authoritative for the rest of the process lifetime.
        log::error!(
            "Failed to persist ledger after processing {}: {}",
            record.doc_id,
            e
        );
    }

    Ok(())
}
