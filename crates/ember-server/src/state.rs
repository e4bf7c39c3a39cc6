//! Application state.

use ember_core::FocusEngine;
use ember_core::InMemorySessionStore;
use ember_core::SessionStore;
use ember_core::generator::{CannedGenerator, GeneratorConfig, OpenAiGenerator, SuggestionGenerator};
use ember_core::rating::{RatingBook, RatingSource};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::{Config, Environment, StoreBackend};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Focus session workflow engine
    pub engine: Arc<FocusEngine>,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config, engine: FocusEngine) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            start_time: Instant::now(),
        })
    }

    /// Wire the store, rating book and generator described by `config`.
    pub fn build(config: Config) -> anyhow::Result<Arc<Self>> {
        let (store, ratings) = open_backends(&config)?;
        let generator = select_generator(&config)?;

        info!(
            store = ?config.store_backend,
            generator = generator.name(),
            ttl_secs = config.store_ttl_secs,
            max_workflows = config.max_workflows,
            "Focus engine ready"
        );

        let engine = FocusEngine::new(store, ratings, generator);
        Ok(Self::new(config, engine))
    }
}

type Backends = (Arc<dyn SessionStore>, Arc<dyn RatingSource>);

/// Session store and rating source; both live in the same backend.
fn open_backends(config: &Config) -> anyhow::Result<Backends> {
    match config.store_backend {
        StoreBackend::Memory => Ok((
            Arc::new(InMemorySessionStore::new(config.store_config())),
            Arc::new(RatingBook::new(config.store_config())),
        )),
        #[cfg(feature = "sqlite")]
        StoreBackend::Sqlite => {
            use ember_core::db::{Database, SqliteRatingSource, SqliteSessionStore};

            let db = Arc::new(Database::open_path(&config.database_path)?);
            info!("Database opened at {:?}", config.database_path);
            Ok((
                Arc::new(SqliteSessionStore::new(Arc::clone(&db), config.store_config())),
                Arc::new(SqliteRatingSource::new(db, config.store_config())),
            ))
        }
        #[cfg(not(feature = "sqlite"))]
        StoreBackend::Sqlite => {
            anyhow::bail!("sqlite store requested but ember-server was built without the sqlite feature")
        }
    }
}

/// OpenAI-backed generator when a key is present; otherwise the canned
/// generator in development and a startup error in production.
fn select_generator(config: &Config) -> anyhow::Result<Arc<dyn SuggestionGenerator>> {
    let settings = &config.generator;

    match (&settings.api_key, config.environment) {
        (Some(key), _) => {
            let generator = OpenAiGenerator::new(GeneratorConfig {
                api_key: Some(key.clone()),
                base_url: settings.base_url.clone(),
                model: settings.model.clone(),
                timeout_secs: settings.timeout_secs,
                ..GeneratorConfig::default()
            })?;
            Ok(Arc::new(generator))
        }
        (None, Environment::Production) => {
            anyhow::bail!("OPENAI_API_KEY is required when EMBER_ENV=production")
        }
        (None, Environment::Development) => {
            warn!("OPENAI_API_KEY not set, serving canned suggestions");
            Ok(Arc::new(CannedGenerator::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(pairs: &[(&str, &str)]) -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = Config::from_sources(dir.path(), None, |k| env.get(k).cloned()).unwrap();
        (dir, config)
    }

    #[test]
    fn test_development_without_key_uses_canned() {
        let (_dir, config) = config_with(&[]);
        let state = AppState::build(config).unwrap();
        assert_eq!(state.engine.generator_name(), CannedGenerator::new().name());
    }

    #[test]
    fn test_production_without_key_fails() {
        let (_dir, config) = config_with(&[("EMBER_ENV", "production")]);
        assert!(AppState::build(config).is_err());
    }

    #[test]
    fn test_key_selects_openai_generator() {
        let (_dir, config) = config_with(&[("EMBER_ENV", "production"), ("OPENAI_API_KEY", "sk-test")]);
        let state = AppState::build(config).unwrap();
        assert_ne!(state.engine.generator_name(), CannedGenerator::new().name());
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_sqlite_store_opens_database() {
        let (dir, config) = config_with(&[("EMBER_STORE", "sqlite")]);
        let state = AppState::build(config).unwrap();

        state.engine.create("s1", "Health").unwrap();
        assert!(dir.path().join("ember.db").exists());
        assert_eq!(state.engine.store().len().unwrap(), 1);
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_sqlite_ratings_survive_restart() {
        use ember_core::types::WheelCategory;

        let (dir, config) = config_with(&[("EMBER_STORE", "sqlite")]);
        let state = AppState::build(config.clone()).unwrap();
        state
            .engine
            .submit_wheel(
                "s1",
                &[WheelCategory {
                    category: "Health".to_string(),
                    value: 8,
                }],
            )
            .unwrap();
        drop(state);

        let state = AppState::build(config).unwrap();
        let ratings = state.engine.latest_ratings("s1").unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].value, 8);
        drop(dir);
    }
}
