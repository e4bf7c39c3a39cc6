//! In-process session store implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use super::{SessionStore, StoreConfig};
use crate::error::{Error, Result};
use crate::types::{FocusWorkflow, WorkflowKey};

/// In-memory session store.
///
/// Bounded by `StoreConfig::max_workflows`: inserting a new key at capacity
/// first drops expired records, then the least-recently-updated one.
pub struct InMemorySessionStore {
    records: RwLock<HashMap<WorkflowKey, FocusWorkflow>>,
    config: StoreConfig,
}

impl InMemorySessionStore {
    /// Create a new in-memory store.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(StoreConfig::default())
    }

    /// Get the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn make_room(&self, records: &mut HashMap<WorkflowKey, FocusWorkflow>, now: i64) {
        if records.len() < self.config.max_workflows {
            return;
        }

        records.retain(|_, wf| !self.config.is_expired(wf.updated_at, now));

        while records.len() >= self.config.max_workflows {
            let oldest = records
                .iter()
                .min_by_key(|(_, wf)| wf.updated_at)
                .map(|(key, _)| key.clone());

            match oldest {
                Some(key) => {
                    debug!(key = %key, "Evicting least recently updated focus session");
                    records.remove(&key);
                }
                None => break,
            }
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &WorkflowKey) -> Result<Option<FocusWorkflow>> {
        let records = self.records.read().map_err(|_| Error::LockPoisoned)?;
        let now = Self::now();
        Ok(records
            .get(key)
            .filter(|wf| !self.config.is_expired(wf.updated_at, now))
            .cloned())
    }

    fn put(&self, workflow: FocusWorkflow) -> Result<()> {
        let mut records = self.records.write().map_err(|_| Error::LockPoisoned)?;
        let key = workflow.key();

        if !records.contains_key(&key) {
            self.make_room(&mut records, Self::now());
        }

        records.insert(key, workflow);
        Ok(())
    }

    fn list_by_session(&self, session_key: &str) -> Result<Vec<FocusWorkflow>> {
        let records = self.records.read().map_err(|_| Error::LockPoisoned)?;
        let now = Self::now();
        Ok(records
            .values()
            .filter(|wf| wf.session_key == session_key)
            .filter(|wf| !self.config.is_expired(wf.updated_at, now))
            .cloned()
            .collect())
    }

    fn evict_expired(&self, now: i64) -> Result<usize> {
        let mut records = self.records.write().map_err(|_| Error::LockPoisoned)?;
        let before = records.len();
        records.retain(|_, wf| !self.config.is_expired(wf.updated_at, now));
        Ok(before - records.len())
    }

    fn len(&self) -> Result<usize> {
        let records = self.records.read().map_err(|_| Error::LockPoisoned)?;
        Ok(records.len())
    }
}
