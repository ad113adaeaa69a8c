use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::slot::SlotStorage;

/// File-backed slots: one `<key>.json` file per key inside a directory.
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\']);
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

fn slot_err(key: &str, source: std::io::Error) -> StoreError {
    StoreError::Slot {
        key: key.to_string(),
        source,
    }
}

#[async_trait]
impl SlotStorage for FileSlot {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Slot file {:?} does not exist yet", path);
                Ok(None)
            }
            Err(e) => Err(slot_err(key, e)),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| slot_err(key, e))?;

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, value)
            .await
            .map_err(|e| slot_err(key, e))?;
        tokio::fs::rename(&temp_path, &path)
            .await
            .map_err(|e| slot_err(key, e))?;

        debug!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }
}
