//! SQLite-backed wheel ratings.

use std::collections::HashSet;
use std::sync::Arc;

use rusqlite::params;
use tracing::debug;

use super::Database;
use crate::error::Result;
use crate::rating::{RatingSource, validate_batch};
use crate::store::StoreConfig;
use crate::types::WheelCategory;

/// Database-backed rating source.
///
/// Every row of a session shares one `updated_at`, so a session expires as a
/// whole, matching [`RatingBook`](crate::rating::RatingBook).
pub struct SqliteRatingSource {
    db: Arc<Database>,
    config: StoreConfig,
}

impl SqliteRatingSource {
    pub fn new(db: Arc<Database>, config: StoreConfig) -> Self {
        Self { db, config }
    }

    fn cutoff(&self, now: i64) -> i64 {
        now.saturating_sub(self.config.ttl_millis())
    }
}

impl RatingSource for SqliteRatingSource {
    fn latest_ratings(&self, session_key: &str) -> Result<Vec<WheelCategory>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            "SELECT category, value FROM wheel_rating
             WHERE session_key = ?1 AND updated_at > ?2
             ORDER BY category",
        )?;

        let cutoff = self.cutoff(chrono::Utc::now().timestamp_millis());
        let ratings = stmt
            .query_map(params![session_key, cutoff], |row| {
                Ok(WheelCategory {
                    category: row.get(0)?,
                    value: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ratings)
    }

    fn record_ratings(&self, session_key: &str, ratings: &[WheelCategory]) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let cutoff = self.cutoff(now);

        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;

        // Expired readings of this session no longer count
        tx.execute(
            "DELETE FROM wheel_rating WHERE session_key = ?1 AND updated_at <= ?2",
            params![session_key, cutoff],
        )?;

        let known: HashSet<String> = {
            let mut stmt = tx.prepare("SELECT category FROM wheel_rating WHERE session_key = ?1")?;
            let categories = stmt
                .query_map(params![session_key], |row| row.get(0))?
                .collect::<std::result::Result<_, _>>()?;
            categories
        };
        validate_batch(
            &self.config,
            ratings,
            |category| known.contains(category),
            known.len(),
        )?;
        if ratings.is_empty() {
            return Ok(());
        }

        if known.is_empty() {
            let max = i64::try_from(self.config.max_workflows).unwrap_or(i64::MAX);
            let sessions: i64 = tx.query_row(
                "SELECT COUNT(DISTINCT session_key) FROM wheel_rating",
                [],
                |row| row.get(0),
            )?;

            if sessions >= max {
                tx.execute(
                    "DELETE FROM wheel_rating WHERE updated_at <= ?1",
                    params![cutoff],
                )?;
                let remaining: i64 = tx.query_row(
                    "SELECT COUNT(DISTINCT session_key) FROM wheel_rating",
                    [],
                    |row| row.get(0),
                )?;
                if remaining >= max {
                    let evicted = tx.execute(
                        "DELETE FROM wheel_rating WHERE session_key IN (
                             SELECT session_key FROM wheel_rating
                             GROUP BY session_key
                             ORDER BY MAX(updated_at) ASC
                             LIMIT ?1
                         )",
                        params![remaining - max + 1],
                    )?;
                    debug!(evicted, "Evicted least recently rated sessions");
                }
            }
        }

        for rating in ratings {
            tx.execute(
                "INSERT INTO wheel_rating (session_key, category, value, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (session_key, category) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
                params![session_key, rating.category, rating.value, now],
            )?;
        }
        tx.execute(
            "UPDATE wheel_rating SET updated_at = ?2 WHERE session_key = ?1",
            params![session_key, now],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn evict_expired(&self, now: i64) -> Result<usize> {
        let cutoff = self.cutoff(now);
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;

        let sessions: i64 = tx.query_row(
            "SELECT COUNT(DISTINCT session_key) FROM wheel_rating WHERE updated_at <= ?1",
            params![cutoff],
            |row| row.get(0),
        )?;
        tx.execute(
            "DELETE FROM wheel_rating WHERE updated_at <= ?1",
            params![cutoff],
        )?;

        tx.commit()?;
        Ok(sessions as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn source(config: StoreConfig) -> SqliteRatingSource {
        SqliteRatingSource::new(Arc::new(Database::open_in_memory().unwrap()), config)
    }

    fn rating(category: &str, value: u8) -> WheelCategory {
        WheelCategory {
            category: category.to_string(),
            value,
        }
    }

    #[test]
    fn test_record_and_replace() {
        let source = source(StoreConfig::default());
        source
            .record_ratings("s1", &[rating("Work", 7), rating("Health", 3)])
            .unwrap();
        source.record_ratings("s1", &[rating("Health", 6)]).unwrap();

        assert_eq!(
            source.latest_ratings("s1").unwrap(),
            vec![rating("Health", 6), rating("Work", 7)]
        );
        assert!(source.latest_ratings("s2").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_batch_leaves_nothing() {
        let source = source(StoreConfig::default());
        let result = source.record_ratings("s1", &[rating("Work", 7), rating("Health", 0)]);

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert!(source.latest_ratings("s1").unwrap().is_empty());
    }

    #[test]
    fn test_categories_per_session_are_capped() {
        let source = source(StoreConfig {
            max_categories_per_session: 2,
            ..StoreConfig::default()
        });
        source
            .record_ratings("s1", &[rating("Work", 7), rating("Health", 3)])
            .unwrap();

        let result = source.record_ratings("s1", &[rating("Family", 5)]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(source.latest_ratings("s1").unwrap().len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest_session() {
        let source = source(StoreConfig {
            ttl_secs: 3600,
            max_workflows: 2,
            ..StoreConfig::default()
        });
        source.record_ratings("s1", &[rating("Work", 1)]).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        source.record_ratings("s2", &[rating("Work", 2)]).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        source.record_ratings("s3", &[rating("Work", 3)]).unwrap();

        assert!(source.latest_ratings("s1").unwrap().is_empty());
        assert_eq!(source.latest_ratings("s2").unwrap().len(), 1);
        assert_eq!(source.latest_ratings("s3").unwrap().len(), 1);
    }

    #[test]
    fn test_expired_sessions_hidden_and_evicted() {
        let source = source(StoreConfig {
            ttl_secs: 0,
            ..StoreConfig::default()
        });
        source.record_ratings("s1", &[rating("Work", 4)]).unwrap();

        assert!(source.latest_ratings("s1").unwrap().is_empty());
        let now = chrono::Utc::now().timestamp_millis();
        assert_eq!(source.evict_expired(now).unwrap(), 1);
        assert_eq!(source.evict_expired(now).unwrap(), 0);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ember.db");

        {
            let db = Arc::new(Database::open_path(&path).unwrap());
            let source = SqliteRatingSource::new(db, StoreConfig::default());
            source.record_ratings("s1", &[rating("Health", 8)]).unwrap();
        }

        let db = Arc::new(Database::open_path(&path).unwrap());
        let source = SqliteRatingSource::new(db, StoreConfig::default());
        assert_eq!(source.latest_ratings("s1").unwrap(), vec![rating("Health", 8)]);
    }
}
