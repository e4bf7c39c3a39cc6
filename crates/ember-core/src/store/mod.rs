//! Focus-session storage.
//!
//! One workflow record is kept per (session key, category). Records are
//! evicted after a period without updates, and the in-memory store is bounded
//! so that caller-chosen session keys cannot grow it without limit.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    SessionStore                          │
//! │  get(key) ─► Option<FocusWorkflow>                       │
//! │  put(workflow)          (atomic upsert per key)          │
//! │  list_by_session(key) ─► Vec<FocusWorkflow>              │
//! │  evict_expired(now)     (TTL on updated_at)              │
//! │         │                              │                 │
//! │  InMemorySessionStore          SqliteSessionStore (db)   │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod memory;
mod traits;

pub use memory::*;
pub use traits::*;

/// Configuration for session stores.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Seconds a workflow survives without updates (default: 30 days).
    pub ttl_secs: u64,
    /// Maximum number of workflows held in memory.
    pub max_workflows: usize,
    /// Maximum number of rated categories held per session.
    pub max_categories_per_session: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 30 * 24 * 3600, // 30 days
            max_workflows: 10_000,
            max_categories_per_session: 32,
        }
    }
}

impl StoreConfig {
    /// TTL in milliseconds, saturating.
    pub fn ttl_millis(&self) -> i64 {
        i64::try_from(self.ttl_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }

    /// Whether a record last updated at `updated_at` has expired at `now`.
    pub fn is_expired(&self, updated_at: i64, now: i64) -> bool {
        now.saturating_sub(updated_at) >= self.ttl_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_config_default() {
        let config = StoreConfig::default();
        assert_eq!(config.ttl_secs, 2_592_000);
        assert_eq!(config.max_workflows, 10_000);
        assert_eq!(config.max_categories_per_session, 32);
    }

    #[test]
    fn test_is_expired() {
        let config = StoreConfig {
            ttl_secs: 60,
            max_workflows: 10,
            ..StoreConfig::default()
        };
        assert!(!config.is_expired(1_000, 60_999));
        assert!(config.is_expired(1_000, 61_000));
    }

    #[test]
    fn test_ttl_millis_saturates() {
        let config = StoreConfig {
            ttl_secs: u64::MAX,
            max_workflows: 1,
            ..StoreConfig::default()
        };
        assert_eq!(config.ttl_millis(), i64::MAX);
    }
}
