use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// On-disk shape of `credentials.toml`. Keys this version does not know
/// about are carried through a save untouched.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tmdb_api_key: Option<String>,
    #[serde(flatten)]
    other: BTreeMap<String, toml::Value>,
}

/// Secrets kept apart from `config.toml` so the config can be shared.
pub struct CredentialStore {
    path: PathBuf,
    file: CredentialsFile,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: CredentialsFile::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file if present; a missing file leaves the store empty.
    pub fn load(&mut self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        self.file = toml::from_str(&content)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, toml::to_string_pretty(&self.file)?)?;
        restrict_permissions(&self.path)?;
        Ok(())
    }

    pub fn get_tmdb_api_key(&self) -> Option<&String> {
        self.file.tmdb_api_key.as_ref()
    }

    pub fn set_tmdb_api_key(&mut self, key: String) {
        self.file.tmdb_api_key = Some(key);
    }

    pub fn clear_tmdb_api_key(&mut self) {
        self.file.tmdb_api_key = None;
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
