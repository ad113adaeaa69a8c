use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::credentials::CredentialStore;

/// Environment variable that overrides every other source of the TMDB key.
pub const API_KEY_ENV: &str = "REELNOTES_TMDB_API_KEY";

/// Value written by `config init`; treated as "no key configured".
pub const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("server.bind_addr is not a valid socket address: {0}")]
    InvalidBindAddr(String),
    #[error("tmdb.base_url must be an http(s) URL, got {0:?}")]
    InvalidBaseUrl(String),
    #[error("reviews.slot_key cannot be empty")]
    EmptySlotKey,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub reviews: ReviewsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TmdbConfig {
    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewsConfig {
    #[serde(default = "default_slot_key")]
    pub slot_key: String,
    #[serde(default = "default_true")]
    pub seed_fixtures: bool,
    #[serde(default = "default_user")]
    pub default_user: String,
    #[serde(default)]
    pub id_strategy: IdStrategy,
}

/// How new review ids are minted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// Random v4 UUID
    #[default]
    Uuid,
    /// Milliseconds since the epoch, as older slots were written
    Timestamp,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Force JSON (or plain) log lines; unset means JSON when stdout is not a terminal
    #[serde(default)]
    pub json: Option<bool>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_bind_addr() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_slot_key() -> String {
    "movieReviews".to_string()
}

fn default_user() -> String {
    "user123".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: default_tmdb_base_url(),
            api_key: None,
        }
    }
}

impl Default for ReviewsConfig {
    fn default() -> Self {
        Self {
            slot_key: default_slot_key(),
            seed_fixtures: default_true(),
            default_user: default_user(),
            id_strategy: IdStrategy::default(),
        }
    }
}

fn usable_key(key: &str) -> bool {
    !key.trim().is_empty() && key != API_KEY_PLACEHOLDER
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;

        let base = self.tmdb.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.tmdb.base_url.clone()));
        }

        if self.reviews.slot_key.trim().is_empty() {
            return Err(ConfigError::EmptySlotKey);
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(self.server.bind_addr.clone()))
    }

    /// Resolve the upstream key: environment, then credentials file, then config.
    pub fn resolve_api_key(&self, credentials: &CredentialStore) -> Option<String> {
        self.resolve_api_key_with(std::env::var(API_KEY_ENV).ok(), credentials)
    }

    pub fn resolve_api_key_with(&self, env_value: Option<String>, credentials: &CredentialStore) -> Option<String> {
        if let Some(key) = env_value.filter(|k| usable_key(k)) {
            return Some(key);
        }
        if let Some(key) = credentials.get_tmdb_api_key().filter(|k| usable_key(k)) {
            return Some(key.clone());
        }
        self.tmdb.api_key.clone().filter(|k| usable_key(k))
    }

    pub fn is_tmdb_configured(&self, credentials: &CredentialStore) -> bool {
        self.resolve_api_key(credentials).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.server.bind_addr = "0.0.0.0:8080".to_string();
        config.reviews.id_strategy = IdStrategy::Timestamp;
        config.reviews.seed_fixtures = false;

        config.save_to_file(file.path()).unwrap();

        let loaded = Config::load_from_file(file.path()).unwrap();
        assert_eq!(loaded.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(loaded.reviews.id_strategy, IdStrategy::Timestamp);
        assert!(!loaded.reviews.seed_fixtures);
        assert_eq!(loaded.reviews.slot_key, "movieReviews");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str("[tmdb]\napi_key = \"k\"\n").unwrap();
        assert_eq!(config.tmdb.api_key.as_deref(), Some("k"));
        assert_eq!(config.tmdb.base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.server.bind_addr, "127.0.0.1:5000");
        assert_eq!(config.reviews.default_user, "user123");
        assert!(config.reviews.seed_fixtures);
        assert_eq!(config.logging.json, None);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.reviews.slot_key, "movieReviews");
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.server.bind_addr = "localhost".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidBindAddr("localhost".to_string()))
        );
        config.server.bind_addr = default_bind_addr();

        config.tmdb.base_url = "ftp://example.com".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBaseUrl(_))));
        config.tmdb.base_url = default_tmdb_base_url();

        config.reviews.slot_key = "  ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::EmptySlotKey));
    }

    #[test]
    fn test_api_key_resolution_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut creds = CredentialStore::new(dir.path().join("credentials.toml"));
        let mut config = Config::default();

        assert_eq!(config.resolve_api_key_with(None, &creds), None);

        config.tmdb.api_key = Some(API_KEY_PLACEHOLDER.to_string());
        assert_eq!(config.resolve_api_key_with(None, &creds), None);

        config.tmdb.api_key = Some("from-config".to_string());
        assert_eq!(config.resolve_api_key_with(None, &creds).as_deref(), Some("from-config"));

        creds.set_tmdb_api_key("from-credentials".to_string());
        assert_eq!(config.resolve_api_key_with(None, &creds).as_deref(), Some("from-credentials"));

        let env = Some("from-env".to_string());
        assert_eq!(config.resolve_api_key_with(env, &creds).as_deref(), Some("from-env"));

        // Blank env value does not shadow the others
        assert_eq!(
            config.resolve_api_key_with(Some(String::new()), &creds).as_deref(),
            Some("from-credentials")
        );
    }
}
