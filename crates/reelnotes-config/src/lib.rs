pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{Config, ConfigError, IdStrategy, LoggingConfig, ReviewsConfig, ServerConfig, TmdbConfig, API_KEY_ENV, API_KEY_PLACEHOLDER};
pub use credentials::CredentialStore;
pub use paths::{PathManager, container_base_path};
