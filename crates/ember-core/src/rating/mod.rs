//! Latest wheel ratings per session.
//!
//! Summaries report the most recent rating the user gave each category, from
//! the wheel questionnaire or from a weekly check-in. Categories without a
//! reading fall back to [`NEUTRAL_RATING`](crate::types::NEUTRAL_RATING).

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use tracing::debug;

use crate::error::{Error, Result};
use crate::store::StoreConfig;
use crate::types::{WheelCategory, validate_category, validate_rating};

/// Source of the latest per-category ratings of a session.
pub trait RatingSource: Send + Sync {
    /// Latest rating of every category the session has rated.
    fn latest_ratings(&self, session_key: &str) -> Result<Vec<WheelCategory>>;

    /// Record new ratings, replacing earlier readings of the same categories.
    fn record_ratings(&self, session_key: &str, ratings: &[WheelCategory]) -> Result<()>;

    /// Delete sessions not updated within the TTL at `now` (Unix millis).
    fn evict_expired(&self, now: i64) -> Result<usize>;
}

/// Check every rating and category of a batch, and that the session stays
/// within `max_categories_per_session` once the batch is applied.
pub(crate) fn validate_batch(
    config: &StoreConfig,
    ratings: &[WheelCategory],
    known: impl Fn(&str) -> bool,
    known_count: usize,
) -> Result<()> {
    let mut added: HashSet<&str> = HashSet::new();
    for rating in ratings {
        validate_rating(i64::from(rating.value))?;
        validate_category(&rating.category)?;
        if !known(&rating.category) {
            added.insert(&rating.category);
        }
    }

    let total = known_count + added.len();
    if total > config.max_categories_per_session {
        return Err(Error::invalid(format!(
            "a session can rate at most {} categories, this would make {}",
            config.max_categories_per_session, total
        )));
    }
    Ok(())
}

struct SessionRatings {
    values: HashMap<String, u8>,
    updated_at: i64,
}

/// In-memory rating book, bounded like the session store.
pub struct RatingBook {
    sessions: RwLock<HashMap<String, SessionRatings>>,
    config: StoreConfig,
}

impl RatingBook {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl Default for RatingBook {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl RatingSource for RatingBook {
    fn latest_ratings(&self, session_key: &str) -> Result<Vec<WheelCategory>> {
        let sessions = self.sessions.read().map_err(|_| Error::LockPoisoned)?;
        let now = chrono::Utc::now().timestamp_millis();

        let mut ratings: Vec<WheelCategory> = sessions
            .get(session_key)
            .filter(|s| !self.config.is_expired(s.updated_at, now))
            .map(|s| {
                s.values
                    .iter()
                    .map(|(category, value)| WheelCategory {
                        category: category.clone(),
                        value: *value,
                    })
                    .collect()
            })
            .unwrap_or_default();

        ratings.sort_by(|a, b| a.category.cmp(&b.category));
        Ok(ratings)
    }

    fn record_ratings(&self, session_key: &str, ratings: &[WheelCategory]) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(|_| Error::LockPoisoned)?;
        let now = chrono::Utc::now().timestamp_millis();

        let existing = sessions
            .get(session_key)
            .filter(|s| !self.config.is_expired(s.updated_at, now));
        validate_batch(
            &self.config,
            ratings,
            |category| existing.is_some_and(|s| s.values.contains_key(category)),
            existing.map_or(0, |s| s.values.len()),
        )?;
        if sessions
            .get(session_key)
            .is_some_and(|s| self.config.is_expired(s.updated_at, now))
        {
            sessions.remove(session_key);
        }

        if !sessions.contains_key(session_key) && sessions.len() >= self.config.max_workflows {
            sessions.retain(|_, s| !self.config.is_expired(s.updated_at, now));
            while sessions.len() >= self.config.max_workflows {
                let Some(oldest) = sessions
                    .iter()
                    .min_by_key(|(_, s)| s.updated_at)
                    .map(|(k, _)| k.clone())
                else {
                    break;
                };
                debug!(session_key = %oldest, "Evicting least recently rated session");
                sessions.remove(&oldest);
            }
        }

        let entry = sessions
            .entry(session_key.to_string())
            .or_insert_with(|| SessionRatings {
                values: HashMap::new(),
                updated_at: now,
            });
        for rating in ratings {
            entry.values.insert(rating.category.clone(), rating.value);
        }
        entry.updated_at = now;

        Ok(())
    }

    fn evict_expired(&self, now: i64) -> Result<usize> {
        let mut sessions = self.sessions.write().map_err(|_| Error::LockPoisoned)?;
        let before = sessions.len();
        sessions.retain(|_, s| !self.config.is_expired(s.updated_at, now));
        Ok(before - sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(category: &str, value: u8) -> WheelCategory {
        WheelCategory {
            category: category.to_string(),
            value,
        }
    }

    #[test]
    fn test_record_and_read() {
        let book = RatingBook::with_defaults();
        book.record_ratings("s1", &[rating("Work", 7), rating("Health", 3)])
            .unwrap();

        assert_eq!(
            book.latest_ratings("s1").unwrap(),
            vec![rating("Health", 3), rating("Work", 7)]
        );
        assert!(book.latest_ratings("s2").unwrap().is_empty());
    }

    #[test]
    fn test_later_reading_replaces_earlier() {
        let book = RatingBook::with_defaults();
        book.record_ratings("s1", &[rating("Health", 3)]).unwrap();
        book.record_ratings("s1", &[rating("Health", 6)]).unwrap();

        assert_eq!(book.latest_ratings("s1").unwrap(), vec![rating("Health", 6)]);
    }

    #[test]
    fn test_out_of_range_rejects_whole_batch() {
        let book = RatingBook::with_defaults();
        let result = book.record_ratings("s1", &[rating("Health", 4), rating("Work", 11)]);

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert!(book.latest_ratings("s1").unwrap().is_empty());
    }

    #[test]
    fn test_capacity_bounds_sessions() {
        let book = RatingBook::new(StoreConfig {
            ttl_secs: 3600,
            max_workflows: 1,
            ..StoreConfig::default()
        });
        book.record_ratings("s1", &[rating("Health", 4)]).unwrap();
        book.record_ratings("s2", &[rating("Health", 5)]).unwrap();

        assert!(book.latest_ratings("s1").unwrap().is_empty());
        assert_eq!(book.latest_ratings("s2").unwrap().len(), 1);
    }

    #[test]
    fn test_categories_per_session_are_capped() {
        let book = RatingBook::new(StoreConfig {
            ttl_secs: 3600,
            max_workflows: 10,
            max_categories_per_session: 3,
        });
        for i in 0..3 {
            book.record_ratings("s1", &[rating(&format!("Area {}", i), 5)])
                .unwrap();
        }

        let result = book.record_ratings("s1", &[rating("Area 3", 5)]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        // Re-rating a known category is still allowed
        book.record_ratings("s1", &[rating("Area 0", 9)]).unwrap();
        assert_eq!(book.latest_ratings("s1").unwrap().len(), 3);
    }

    #[test]
    fn test_many_distinct_categories_stay_bounded() {
        let book = RatingBook::new(StoreConfig {
            ttl_secs: 3600,
            max_workflows: 10,
            ..StoreConfig::default()
        });
        let cap = book.config.max_categories_per_session;
        for i in 0..(cap * 10) {
            let _ = book.record_ratings("s1", &[rating(&format!("{:0>60}", i), 5)]);
        }

        assert_eq!(book.latest_ratings("s1").unwrap().len(), cap);
    }

    #[test]
    fn test_overlong_or_blank_category_rejected() {
        let book = RatingBook::with_defaults();
        let long = "x".repeat(crate::types::MAX_CATEGORY_LEN + 1);

        assert!(matches!(
            book.record_ratings("s1", &[rating(&long, 5)]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            book.record_ratings("s1", &[rating("  ", 5)]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(book.latest_ratings("s1").unwrap().is_empty());
    }

    #[test]
    fn test_evict_expired() {
        let book = RatingBook::new(StoreConfig {
            ttl_secs: 60,
            max_workflows: 10,
            ..StoreConfig::default()
        });
        book.record_ratings("s1", &[rating("Health", 4)]).unwrap();

        let later = chrono::Utc::now().timestamp_millis() + 61_000;
        assert_eq!(book.evict_expired(later).unwrap(), 1);
        assert!(book.latest_ratings("s1").unwrap().is_empty());
    }
}
