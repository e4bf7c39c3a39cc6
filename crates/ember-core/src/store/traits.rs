//! Session store trait defining the interface for workflow persistence.

use crate::error::Result;
use crate::types::{FocusWorkflow, WorkflowKey};

/// Core trait for workflow storage operations.
///
/// Implementations handle the actual storage backend (in-memory, SQLite).
/// `put` must be atomic for a single record; read-modify-write sequences are
/// serialized by the engine, not by the store.
pub trait SessionStore: Send + Sync {
    /// Retrieve the workflow for a (session, category) pair.
    fn get(&self, key: &WorkflowKey) -> Result<Option<FocusWorkflow>>;

    /// Insert or replace the workflow keyed by its (session, category).
    fn put(&self, workflow: FocusWorkflow) -> Result<()>;

    /// All live workflows of a session, in no particular order.
    fn list_by_session(&self, session_key: &str) -> Result<Vec<FocusWorkflow>>;

    /// Delete records whose last update is older than the TTL at `now` (Unix
    /// millis). Returns the number removed.
    fn evict_expired(&self, now: i64) -> Result<usize>;

    /// Number of records currently held, expired or not.
    fn len(&self) -> Result<usize>;

    /// Whether the store holds no records.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
