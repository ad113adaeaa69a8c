use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use reelnotes_config::{Config, CredentialStore, PathManager, API_KEY_ENV};
use reelnotes_gateway::TmdbClient;
use reelnotes_store::{FileSlot, ReviewStore, StoreOptions};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Everything a command needs: where files live, the loaded config and credentials.
pub struct AppContext {
    pub paths: PathManager,
    pub config_file: PathBuf,
    pub config: Config,
    pub credentials: CredentialStore,
    /// Why the config file was not used, when loaded leniently.
    pub config_problem: Option<String>,
}

impl AppContext {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        Self::load_with(PathManager::default(), config_override)
    }

    /// Like [`AppContext::load`], but an unreadable or invalid config falls back
    /// to defaults instead of failing. Used by `config` subcommands so a broken
    /// file can still be inspected and replaced.
    pub fn load_lenient(config_override: Option<PathBuf>) -> Result<Self> {
        Self::load_lenient_with(PathManager::default(), config_override)
    }

    pub fn load_with(paths: PathManager, config_override: Option<PathBuf>) -> Result<Self> {
        let config_file = config_override.unwrap_or_else(|| paths.config_file());
        let config = read_config(&config_file)?;
        Self::assemble(paths, config_file, config, None)
    }

    pub fn load_lenient_with(paths: PathManager, config_override: Option<PathBuf>) -> Result<Self> {
        let config_file = config_override.unwrap_or_else(|| paths.config_file());
        match read_config(&config_file) {
            Ok(config) => Self::assemble(paths, config_file, config, None),
            Err(e) => {
                warn!("Ignoring config file: {:#}", e);
                Self::assemble(paths, config_file, Config::default(), Some(format!("{:#}", e)))
            }
        }
    }

    fn assemble(
        paths: PathManager,
        config_file: PathBuf,
        config: Config,
        config_problem: Option<String>,
    ) -> Result<Self> {
        let mut credentials = CredentialStore::new(paths.credentials_file());
        credentials
            .load()
            .map_err(|e| eyre!("Failed to load credentials: {}", e))?;

        Ok(Self {
            paths,
            config_file,
            config,
            credentials,
            config_problem,
        })
    }

    pub fn api_key(&self) -> Option<String> {
        self.config.resolve_api_key(&self.credentials)
    }

    /// TMDB client with whatever key is configured; a missing key is only a warning
    /// because the upstream answers with its own auth error.
    pub fn metadata_source(&self) -> Result<TmdbClient> {
        let api_key = self.api_key().unwrap_or_else(|| {
            warn!(
                "No TMDB API key configured; set {} or run 'reelnotes config set-api-key'",
                API_KEY_ENV
            );
            String::new()
        });
        TmdbClient::new(self.config.tmdb.base_url.clone(), api_key).wrap_err("Failed to build HTTP client")
    }

    /// The local review collection, seeded on first use.
    pub async fn review_store(&self) -> Result<ReviewStore<FileSlot>> {
        let slot = FileSlot::new(self.paths.reviews_dir());
        let store = ReviewStore::open(slot, StoreOptions::from(&self.config.reviews))
            .await
            .wrap_err("Failed to open review collection")?;
        Ok(store)
    }

    pub fn default_user(&self) -> &str {
        &self.config.reviews.default_user
    }
}

fn read_config(config_file: &Path) -> Result<Config> {
    let config = Config::load_or_default(config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config
        .validate()
        .wrap_err_with(|| format!("Invalid configuration in {}", config_file.display()))?;
    Ok(config)
}
