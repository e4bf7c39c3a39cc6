//! SQLite persistence for focus sessions and wheel ratings.
//!
//! Database location is chosen by the caller (the server reads
//! `EMBER_DATABASE_PATH`, defaulting to `~/.ember/ember.db`). The schema is
//! created on open.

mod ratings;
mod store;

pub use ratings::SqliteRatingSource;
pub use store::SqliteSessionStore;

use crate::error::{Error, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS focus_workflow (
    session_key              TEXT    NOT NULL,
    category                 TEXT    NOT NULL,
    questions_json           TEXT    NOT NULL,
    time_budget_minutes      INTEGER,
    selected_activities_json TEXT,
    check_in_notes           TEXT,
    status                   TEXT    NOT NULL,
    created_at               INTEGER NOT NULL,
    updated_at               INTEGER NOT NULL,
    PRIMARY KEY (session_key, category)
);
CREATE INDEX IF NOT EXISTS idx_focus_workflow_updated_at ON focus_workflow (updated_at);
CREATE TABLE IF NOT EXISTS wheel_rating (
    session_key TEXT    NOT NULL,
    category    TEXT    NOT NULL,
    value       INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL,
    PRIMARY KEY (session_key, category)
);
CREATE INDEX IF NOT EXISTS idx_wheel_rating_updated_at ON wheel_rating (updated_at);
";

/// Database connection wrapper.
///
/// Thread-safe via internal Mutex. All database operations acquire the lock.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open database at specific path, creating the schema if needed
    pub fn open_path(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path).map_err(Error::Database)?;
        Self::init(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(Error::Database)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Check database connectivity
    pub fn ping(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("SELECT 1").map_err(Error::Database)
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory_and_ping() {
        let db = Database::open_in_memory().unwrap();
        db.ping().unwrap();
    }

    #[test]
    fn test_open_path_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ember.db");

        let db = Database::open_path(&path).unwrap();
        db.ping().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ember.db");

        drop(Database::open_path(&path).unwrap());
        let db = Database::open_path(&path).unwrap();
        db.ping().unwrap();
    }
}
