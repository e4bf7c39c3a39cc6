//! Server configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Missing generator credentials fall back to canned responses.
    Development,
    /// Missing generator credentials are a startup error.
    Production,
}

impl Environment {
    fn parse(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => anyhow::bail!("Unknown environment '{}'", other),
        }
    }
}

/// Which session store backs the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

impl StoreBackend {
    fn parse(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => anyhow::bail!("Unknown store backend '{}'", other),
        }
    }
}

/// Generator (language model) settings
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to configuration file
    pub config_path: PathBuf,
    /// Address the HTTP server listens on
    pub bind_addr: String,
    /// Deployment environment
    pub environment: Environment,
    /// Session store backend
    pub store_backend: StoreBackend,
    /// Database path (sqlite backend)
    pub database_path: PathBuf,
    /// Seconds a focus session survives without updates
    pub store_ttl_secs: u64,
    /// Maximum focus sessions held by the store
    pub max_workflows: usize,
    /// Maximum rated categories held per session
    pub max_categories_per_session: usize,
    /// Seconds between eviction passes
    pub eviction_interval_secs: u64,
    /// Reject session ids that are not UUID v4
    pub require_uuid_session: bool,
    /// Generator settings
    pub generator: GeneratorSettings,
}

/// Optional values read from `config.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    bind_addr: Option<String>,
    environment: Option<String>,
    store: Option<String>,
    database_path: Option<PathBuf>,
    store_ttl_secs: Option<u64>,
    max_workflows: Option<usize>,
    max_categories_per_session: Option<usize>,
    eviction_interval_secs: Option<u64>,
    require_uuid_session: Option<bool>,
    openai_base_url: Option<String>,
    openai_model: Option<String>,
    generator_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::with_dir(&home.join(".ember"))
    }
}

impl Config {
    fn with_dir(ember_dir: &Path) -> Self {
        Self {
            config_path: ember_dir.join("config.toml"),
            bind_addr: "127.0.0.1:3000".to_string(),
            environment: Environment::Development,
            store_backend: StoreBackend::Memory,
            database_path: ember_dir.join("ember.db"),
            store_ttl_secs: 30 * 24 * 3600,
            max_workflows: 10_000,
            max_categories_per_session: ember_core::StoreConfig::default().max_categories_per_session,
            eviction_interval_secs: 300,
            require_uuid_session: false,
            generator: GeneratorSettings {
                api_key: None,
                base_url: ember_core::generator::DEFAULT_BASE_URL.to_string(),
                model: ember_core::generator::DEFAULT_MODEL.to_string(),
                timeout_secs: 30,
            },
        }
    }

    /// Load configuration from file and environment
    ///
    /// Standard directory structure:
    /// ```text
    /// ~/.ember/
    /// ├── config.toml           # Main configuration (optional)
    /// └── ember.db              # Database (sqlite backend)
    /// ```
    pub fn load() -> anyhow::Result<Self> {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

        // Use EMBER_DIR env var if set, otherwise ~/.ember
        let ember_dir = std::env::var("EMBER_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".ember"));

        std::fs::create_dir_all(&ember_dir)?;

        let config_path = ember_dir.join("config.toml");
        let file = if config_path.exists() {
            Some(std::fs::read_to_string(&config_path)?)
        } else {
            None
        };

        Self::from_sources(&ember_dir, file.as_deref(), |key| std::env::var(key).ok())
    }

    /// Build configuration from a directory, optional file contents and an
    /// environment lookup. Environment values win over the file.
    pub fn from_sources(
        ember_dir: &Path,
        file: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let mut config = Self::with_dir(ember_dir);

        let file: FileConfig = match file {
            Some(contents) => toml::from_str(contents)?,
            None => FileConfig::default(),
        };

        if let Some(v) = file.bind_addr {
            config.bind_addr = v;
        }
        if let Some(v) = file.environment {
            config.environment = Environment::parse(&v)?;
        }
        if let Some(v) = file.store {
            config.store_backend = StoreBackend::parse(&v)?;
        }
        if let Some(v) = file.database_path {
            config.database_path = v;
        }
        if let Some(v) = file.store_ttl_secs {
            config.store_ttl_secs = v;
        }
        if let Some(v) = file.max_workflows {
            config.max_workflows = v;
        }
        if let Some(v) = file.max_categories_per_session {
            config.max_categories_per_session = v;
        }
        if let Some(v) = file.eviction_interval_secs {
            config.eviction_interval_secs = v;
        }
        if let Some(v) = file.require_uuid_session {
            config.require_uuid_session = v;
        }
        if let Some(v) = file.openai_base_url {
            config.generator.base_url = v;
        }
        if let Some(v) = file.openai_model {
            config.generator.model = v;
        }
        if let Some(v) = file.generator_timeout_secs {
            config.generator.timeout_secs = v;
        }

        if let Some(v) = env("EMBER_BIND_ADDR") {
            config.bind_addr = v;
        }
        if let Some(v) = env("EMBER_ENV") {
            config.environment = Environment::parse(&v)?;
        }
        if let Some(v) = env("EMBER_STORE") {
            config.store_backend = StoreBackend::parse(&v)?;
        }
        if let Some(v) = env("EMBER_DATABASE_PATH") {
            config.database_path = PathBuf::from(v);
        }
        if let Some(v) = env("EMBER_STORE_TTL_SECS") {
            config.store_ttl_secs = v.trim().parse()?;
        }
        if let Some(v) = env("EMBER_MAX_WORKFLOWS") {
            config.max_workflows = v.trim().parse()?;
        }
        if let Some(v) = env("EMBER_MAX_CATEGORIES_PER_SESSION") {
            config.max_categories_per_session = v.trim().parse()?;
        }
        if let Some(v) = env("EMBER_EVICTION_INTERVAL_SECS") {
            config.eviction_interval_secs = v.trim().parse()?;
        }
        if let Some(v) = env("EMBER_REQUIRE_UUID_SESSION") {
            config.require_uuid_session = parse_bool(&v)?;
        }
        if let Some(v) = env("OPENAI_API_KEY") {
            let v = v.trim().to_string();
            config.generator.api_key = (!v.is_empty()).then_some(v);
        }
        if let Some(v) = env("OPENAI_BASE_URL") {
            config.generator.base_url = v;
        }
        if let Some(v) = env("OPENAI_MODEL") {
            config.generator.model = v;
        }
        if let Some(v) = env("EMBER_GENERATOR_TIMEOUT_SECS") {
            config.generator.timeout_secs = v.trim().parse()?;
        }

        if config.max_workflows == 0 {
            anyhow::bail!("max_workflows must be at least 1");
        }
        if config.max_categories_per_session == 0 {
            anyhow::bail!("max_categories_per_session must be at least 1");
        }
        if config.eviction_interval_secs == 0 {
            anyhow::bail!("eviction_interval_secs must be at least 1");
        }

        Ok(config)
    }

    /// Store settings for ember-core
    pub fn store_config(&self) -> ember_core::StoreConfig {
        ember_core::StoreConfig {
            ttl_secs: self.store_ttl_secs,
            max_workflows: self.max_workflows,
            max_categories_per_session: self.max_categories_per_session,
        }
    }
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("Invalid boolean '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.config_path.ends_with("config.toml"));
        assert!(config.database_path.ends_with("ember.db"));
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert!(config.generator.api_key.is_none());
    }

    #[test]
    fn test_file_values_applied() {
        let dir = tempfile::tempdir().unwrap();
        let file = r#"
            bind_addr = "0.0.0.0:8080"
            store = "sqlite"
            store_ttl_secs = 600
            max_workflows = 50
            openai_model = "gpt-4o-mini"
        "#;

        let config = Config::from_sources(dir.path(), Some(file), env_from(&[])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.store_backend, StoreBackend::Sqlite);
        assert_eq!(config.store_ttl_secs, 600);
        assert_eq!(config.max_workflows, 50);
        assert_eq!(config.generator.model, "gpt-4o-mini");
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = r#"bind_addr = "0.0.0.0:8080""#;
        let env = env_from(&[
            ("EMBER_BIND_ADDR", "127.0.0.1:9999"),
            ("EMBER_ENV", "production"),
            ("OPENAI_API_KEY", " sk-test "),
            ("EMBER_REQUIRE_UUID_SESSION", "true"),
        ]);

        let config = Config::from_sources(dir.path(), Some(file), env).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9999");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.generator.api_key.as_deref(), Some("sk-test"));
        assert!(config.require_uuid_session);
    }

    #[test]
    fn test_blank_api_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            Config::from_sources(dir.path(), None, env_from(&[("OPENAI_API_KEY", "  ")])).unwrap();
        assert!(config.generator.api_key.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::from_sources(dir.path(), None, env_from(&[("EMBER_STORE", "redis")])).is_err());
        assert!(
            Config::from_sources(dir.path(), None, env_from(&[("EMBER_MAX_WORKFLOWS", "0")])).is_err()
        );
        assert!(
            Config::from_sources(
                dir.path(),
                None,
                env_from(&[("EMBER_MAX_CATEGORIES_PER_SESSION", "0")])
            )
            .is_err()
        );
        assert!(Config::from_sources(dir.path(), Some("max_workflows = \"many\""), env_from(&[])).is_err());
    }

    #[test]
    fn test_paths_follow_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_sources(dir.path(), None, env_from(&[])).unwrap();

        assert!(config.config_path.starts_with(dir.path()));
        assert!(config.database_path.starts_with(dir.path()));
    }

    #[test]
    fn test_store_config() {
        let dir = tempfile::tempdir().unwrap();
        let env = env_from(&[
            ("EMBER_STORE_TTL_SECS", "120"),
            ("EMBER_MAX_WORKFLOWS", "7"),
            ("EMBER_MAX_CATEGORIES_PER_SESSION", "12"),
        ]);
        let config = Config::from_sources(dir.path(), None, env).unwrap();

        let store = config.store_config();
        assert_eq!(store.ttl_secs, 120);
        assert_eq!(store.max_workflows, 7);
        assert_eq!(store.max_categories_per_session, 12);
    }
}
