use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const BASE_PATH_ENV: &str = "REELNOTES_BASE_PATH";

/// Root of the mounted volume when running in a container (`/app` unless overridden).
pub fn container_base_path() -> PathBuf {
    std::env::var_os(BASE_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/app"))
}

/// File layout under one base directory:
///
/// ```text
/// <base>/config.toml
/// <base>/credentials.toml
/// <base>/data/reviews/<slot_key>.json
/// <base>/logs/
/// ```
pub struct PathManager {
    base: PathBuf,
}

impl PathManager {
    /// The per-user location, e.g. `~/.config/reelnotes` on Linux.
    pub fn new() -> Result<Self> {
        let config_root = dirs::config_dir().context("Could not determine config directory")?;
        Ok(Self::with_base(config_root.join("reelnotes")))
    }

    pub fn with_base(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.toml")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.base.join("credentials.toml")
    }

    pub fn reviews_dir(&self) -> PathBuf {
        self.base.join("data").join("reviews")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.base.join("logs")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [self.base.clone(), self.reviews_dir(), self.log_dir()] {
            std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // An existing container volume wins over the per-user directory
        let container = container_base_path();
        if container.is_dir() {
            return Self::with_base(container);
        }
        Self::new().unwrap_or_else(|_| Self::with_base(container))
    }
}
