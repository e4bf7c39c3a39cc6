//! SQLite-backed session store.

use std::sync::Arc;

use rusqlite::{OptionalExtension, params};
use tracing::debug;

use super::Database;
use crate::error::{Error, Result};
use crate::store::{SessionStore, StoreConfig};
use crate::types::{FocusWorkflow, Question, WorkflowKey, WorkflowStatus};

const SELECT_COLUMNS: &str = "SELECT session_key, category, questions_json, time_budget_minutes,
        selected_activities_json, check_in_notes, status, created_at, updated_at
 FROM focus_workflow";

/// Raw row as stored; JSON columns are decoded separately.
struct WorkflowRow {
    session_key: String,
    category: String,
    questions_json: String,
    time_budget_minutes: Option<u32>,
    selected_activities_json: Option<String>,
    check_in_notes: Option<String>,
    status: String,
    created_at: i64,
    updated_at: i64,
}

impl WorkflowRow {
    fn into_workflow(self) -> Result<FocusWorkflow> {
        let questions: Vec<Question> = serde_json::from_str(&self.questions_json)?;
        let selected_activities = self
            .selected_activities_json
            .as_deref()
            .map(serde_json::from_str::<Vec<String>>)
            .transpose()?;
        let status = WorkflowStatus::parse(&self.status).ok_or_else(|| {
            Error::Serialization(format!("unknown workflow status '{}'", self.status))
        })?;

        Ok(FocusWorkflow {
            session_key: self.session_key,
            category: self.category,
            questions,
            time_budget_minutes: self.time_budget_minutes,
            selected_activities,
            check_in_notes: self.check_in_notes,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Database-backed session store.
///
/// Uses SQLite via the Database struct for persistent storage.
pub struct SqliteSessionStore {
    db: Arc<Database>,
    config: StoreConfig,
}

impl SqliteSessionStore {
    /// Create a new database-backed session store.
    pub fn new(db: Arc<Database>, config: StoreConfig) -> Self {
        Self { db, config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn cutoff(&self) -> i64 {
        chrono::Utc::now()
            .timestamp_millis()
            .saturating_sub(self.config.ttl_millis())
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<WorkflowRow> {
        Ok(WorkflowRow {
            session_key: row.get(0)?,
            category: row.get(1)?,
            questions_json: row.get(2)?,
            time_budget_minutes: row.get(3)?,
            selected_activities_json: row.get(4)?,
            check_in_notes: row.get(5)?,
            status: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self, key: &WorkflowKey) -> Result<Option<FocusWorkflow>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE session_key = ?1 AND category = ?2 AND updated_at > ?3",
            SELECT_COLUMNS
        ))?;

        let row = stmt
            .query_row(
                params![key.session_key, key.category, self.cutoff()],
                Self::map_row,
            )
            .optional()?;

        row.map(WorkflowRow::into_workflow).transpose()
    }

    fn put(&self, workflow: FocusWorkflow) -> Result<()> {
        let questions_json = serde_json::to_string(&workflow.questions)?;
        let activities_json = workflow
            .selected_activities
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM focus_workflow WHERE session_key = ?1 AND category = ?2)",
            params![workflow.session_key, workflow.category],
            |row| row.get(0),
        )?;

        if !exists {
            let count: i64 =
                tx.query_row("SELECT COUNT(*) FROM focus_workflow", [], |row| row.get(0))?;
            let max = i64::try_from(self.config.max_workflows).unwrap_or(i64::MAX);

            if count >= max {
                let expired = tx.execute(
                    "DELETE FROM focus_workflow WHERE updated_at <= ?1",
                    params![self.cutoff()],
                )?;
                let remaining = count - expired as i64;
                if remaining >= max {
                    let evicted = tx.execute(
                        "DELETE FROM focus_workflow WHERE rowid IN (
                             SELECT rowid FROM focus_workflow ORDER BY updated_at ASC LIMIT ?1
                         )",
                        params![remaining - max + 1],
                    )?;
                    debug!(evicted, "Evicted least recently updated focus sessions");
                }
            }
        }

        tx.execute(
            "INSERT INTO focus_workflow
             (session_key, category, questions_json, time_budget_minutes,
              selected_activities_json, check_in_notes, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (session_key, category) DO UPDATE SET
                questions_json = excluded.questions_json,
                time_budget_minutes = excluded.time_budget_minutes,
                selected_activities_json = excluded.selected_activities_json,
                check_in_notes = excluded.check_in_notes,
                status = excluded.status,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at",
            params![
                workflow.session_key,
                workflow.category,
                questions_json,
                workflow.time_budget_minutes,
                activities_json,
                workflow.check_in_notes,
                workflow.status.as_str(),
                workflow.created_at,
                workflow.updated_at,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn list_by_session(&self, session_key: &str) -> Result<Vec<FocusWorkflow>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE session_key = ?1 AND updated_at > ?2",
            SELECT_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![session_key, self.cutoff()], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(WorkflowRow::into_workflow).collect()
    }

    fn evict_expired(&self, now: i64) -> Result<usize> {
        let conn = self.db.lock()?;
        let cutoff = now.saturating_sub(self.config.ttl_millis());
        let deleted = conn.execute(
            "DELETE FROM focus_workflow WHERE updated_at <= ?1",
            params![cutoff],
        )?;
        Ok(deleted)
    }

    fn len(&self) -> Result<usize> {
        let conn = self.db.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM focus_workflow", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::focus::build_questions;

    fn store(config: StoreConfig) -> SqliteSessionStore {
        SqliteSessionStore::new(Arc::new(Database::open_in_memory().unwrap()), config)
    }

    fn workflow(session_key: &str, category: &str, updated_at: i64) -> FocusWorkflow {
        FocusWorkflow {
            session_key: session_key.to_string(),
            category: category.to_string(),
            questions: build_questions(category),
            time_budget_minutes: None,
            selected_activities: None,
            check_in_notes: None,
            status: WorkflowStatus::Active,
            created_at: updated_at,
            updated_at,
        }
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    #[test]
    fn test_put_get_preserves_fields() {
        let store = store(StoreConfig::default());
        let mut wf = workflow("s1", "Health", now());
        wf.questions[2].answer = Some("2 hours".to_string());
        wf.time_budget_minutes = Some(120);
        wf.selected_activities = Some(vec!["walk".to_string(), "sleep early".to_string()]);
        wf.check_in_notes = Some("went well".to_string());
        wf.status = WorkflowStatus::Completed;
        store.put(wf.clone()).unwrap();

        let loaded = store.get(&WorkflowKey::new("s1", "Health")).unwrap().unwrap();
        assert_eq!(loaded, wf);
    }

    #[test]
    fn test_upsert_keeps_single_row() {
        let store = store(StoreConfig::default());
        store.put(workflow("s1", "Health", now())).unwrap();

        let mut replacement = workflow("s1", "Health", now());
        replacement.status = WorkflowStatus::Paused;
        store.put(replacement).unwrap();

        assert_eq!(store.len().unwrap(), 1);
        let loaded = store.get(&WorkflowKey::new("s1", "Health")).unwrap().unwrap();
        assert_eq!(loaded.status, WorkflowStatus::Paused);
    }

    #[test]
    fn test_list_by_session() {
        let store = store(StoreConfig::default());
        store.put(workflow("s1", "Health", now())).unwrap();
        store.put(workflow("s1", "Work", now())).unwrap();
        store.put(workflow("s2", "Health", now())).unwrap();

        assert_eq!(store.list_by_session("s1").unwrap().len(), 2);
        assert_eq!(store.list_by_session("s2").unwrap().len(), 1);
        assert!(store.list_by_session("s3").unwrap().is_empty());
    }

    #[test]
    fn test_expired_rows_hidden_and_evicted() {
        let store = store(StoreConfig {
            ttl_secs: 60,
            max_workflows: 10,
            ..StoreConfig::default()
        });
        store.put(workflow("s1", "Old", 0)).unwrap();
        store.put(workflow("s1", "New", now())).unwrap();

        assert!(store.get(&WorkflowKey::new("s1", "Old")).unwrap().is_none());
        assert_eq!(store.list_by_session("s1").unwrap().len(), 1);
        assert_eq!(store.evict_expired(now()).unwrap(), 1);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let store = store(StoreConfig {
            ttl_secs: 3600,
            max_workflows: 2,
            ..StoreConfig::default()
        });
        let t = now();
        store.put(workflow("s1", "A", t - 2_000)).unwrap();
        store.put(workflow("s1", "B", t - 1_000)).unwrap();
        store.put(workflow("s1", "C", t)).unwrap();

        assert_eq!(store.len().unwrap(), 2);
        assert!(store.get(&WorkflowKey::new("s1", "A")).unwrap().is_none());
        assert!(store.get(&WorkflowKey::new("s1", "C")).unwrap().is_some());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ember.db");

        {
            let db = Arc::new(Database::open_path(&path).unwrap());
            let store = SqliteSessionStore::new(db, StoreConfig::default());
            store.put(workflow("s1", "Health", now())).unwrap();
        }

        let db = Arc::new(Database::open_path(&path).unwrap());
        let store = SqliteSessionStore::new(db, StoreConfig::default());
        assert!(store.get(&WorkflowKey::new("s1", "Health")).unwrap().is_some());
    }

    #[test]
    fn test_engine_over_sqlite_store() {
        use crate::focus::FocusEngine;
        use crate::generator::CannedGenerator;
        use crate::rating::RatingBook;

        let engine = FocusEngine::new(
            Arc::new(store(StoreConfig::default())),
            Arc::new(RatingBook::with_defaults()),
            Arc::new(CannedGenerator::new()),
        );
        engine.create("s1", "Health").unwrap();
        let wf = engine.answer_question("s1", "Health", 2, "2 hours").unwrap();
        assert_eq!(wf.time_budget_minutes, Some(120));

        let loaded = engine.get("s1", "Health").unwrap().unwrap();
        assert_eq!(loaded.time_budget_minutes, Some(120));
    }
}
