use std::collections::HashMap;
use std::sync::RwLock;

use crate::document::DocumentStatus;

/// In-memory view of where every job is right now. Faster and more volatile
/// than the record ledger; queried on every status poll.
pub struct StatusCache {
    inner: RwLock<HashMap<String, DocumentStatus>>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn set(&self, doc_id: &str, status: DocumentStatus) {
        let mut map = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Status cache lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        map.insert(doc_id.to_string(), status);
    }

    /// Current status, or `Unknown` for an id this process never saw.
    pub fn get(&self, doc_id: &str) -> DocumentStatus {
        let map = match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Status cache lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        map.get(doc_id).copied().unwrap_or(DocumentStatus::Unknown)
    }
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_for_unseen_id() {
        let cache = StatusCache::new();
        assert_eq!(cache.get("nope"), DocumentStatus::Unknown);
    }

    #[test]
    fn test_set_then_get() {
        let cache = StatusCache::new();
        cache.set("a", DocumentStatus::Queued);
        assert_eq!(cache.get("a"), DocumentStatus::Queued);

        cache.set("a", DocumentStatus::Processing);
        assert_eq!(cache.get("a"), DocumentStatus::Processing);

        cache.set("a", DocumentStatus::Completed);
        assert_eq!(cache.get("a"), DocumentStatus::Completed);
    }

    #[test]
    fn test_entries_are_independent() {
        let cache = StatusCache::new();
        cache.set("a", DocumentStatus::Error);
        cache.set("b", DocumentStatus::Queued);
        assert_eq!(cache.get("a"), DocumentStatus::Error);
        assert_eq!(cache.get("b"), DocumentStatus::Queued);
    }
}
