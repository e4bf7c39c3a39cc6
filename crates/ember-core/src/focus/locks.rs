//! Per-key mutual exclusion for workflow read-modify-write sequences.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::types::WorkflowKey;

/// Lock table keyed by (session, category).
///
/// Entries exist only while some caller holds or waits on them.
#[derive(Debug, Default)]
pub struct KeyLocks {
    table: Mutex<HashMap<WorkflowKey, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with_lock<T>(&self, key: &WorkflowKey, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let slot = {
            let mut table = self.table.lock().map_err(|_| Error::LockPoisoned)?;
            Arc::clone(table.entry(key.clone()).or_default())
        };

        let result = {
            // The guarded value is `()`, a panic in another holder leaves nothing inconsistent.
            let _guard = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f()
        };

        let mut table = self.table.lock().map_err(|_| Error::LockPoisoned)?;
        // One reference in the table, one here: nobody else is queued.
        if Arc::strong_count(&slot) == 2 {
            table.remove(key);
        }

        result
    }

    /// Number of keys currently locked or waited on.
    pub fn len(&self) -> usize {
        self.table.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
