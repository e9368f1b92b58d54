//! Per-document mutual exclusion for scans.

use crate::domain::DocumentId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Registry of one lock per document identity.
///
/// Entries are created on demand and dropped once no caller holds or waits
/// on them.
#[derive(Debug, Default)]
pub struct ScanLocks {
    locks: Mutex<HashMap<DocumentId, Arc<Mutex<()>>>>,
}

impl ScanLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock for `id`.
    pub fn with<T>(&self, id: &DocumentId, f: impl FnOnce() -> T) -> T {
        let entry = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(*id).or_default())
        };

        let result = {
            let _guard = entry.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one here: nobody else is waiting.
        if Arc::strong_count(&entry) <= 2 {
            locks.remove(id);
        }
        result
    }

    /// Number of identities currently tracked.
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
