use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::document::DocumentRecord;
use crate::error::StorageError;

/// Durable ledger of document records, kept as one JSON object keyed by
/// document id. Callers hold the in-memory map as ground truth and rewrite
/// the whole file after every mutation that must survive a restart.
pub struct RecordLedger {
    path: PathBuf,
}

impl RecordLedger {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads all records. A missing or unparseable file yields an empty map;
    /// corruption must never stop the process from starting.
    pub fn load(&self) -> HashMap<String, DocumentRecord> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                log::warn!("Failed to read ledger {}: {}", self.path.display(), e);
                return HashMap::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(records) => records,
            Err(e) => {
                log::warn!(
                    "Ledger {} is corrupt, starting empty: {}",
                    self.path.display(),
                    e
                );
                HashMap::new()
            }
        }
    }

    /// Rewrites the ledger wholesale. Writes to a sibling temp file and
    /// renames over the target so a crash mid-write leaves the prior ledger
    /// intact.
    pub fn save(&self, records: &HashMap<String, DocumentRecord>) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(records)?;

        let tmp_path = self.path.with_extension("json.tmp");
        let mut tmp = std::fs::File::create(&tmp_path).map_err(|e| StorageError::WriteFile {
            path: tmp_path.clone(),
            source: e,
        })?;
        tmp.write_all(&json).map_err(|e| StorageError::WriteFile {
            path: tmp_path.clone(),
            source: e,
        })?;
        tmp.sync_all().map_err(|e| StorageError::WriteFile {
            path: tmp_path.clone(),
            source: e,
        })?;
        drop(tmp);

        std::fs::rename(&tmp_path, &self.path).map_err(|e| StorageError::ReplaceLedger {
            path: self.path.clone(),
            source: e,
        })
    }
}
