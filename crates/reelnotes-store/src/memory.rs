use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::slot::SlotStorage;

/// In-memory slot storage for tests and throwaway sessions.
#[derive(Default)]
pub struct MemorySlot {
    values: RwLock<HashMap<String, String>>,
    simulate_write_error: AtomicBool,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a slot, e.g. with data written by another process.
    pub fn with_value(key: &str, value: &str) -> Self {
        let mut values = HashMap::new();
        values.insert(key.to_string(), value.to_string());
        Self {
            values: RwLock::new(values),
            simulate_write_error: AtomicBool::new(false),
        }
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }
}

#[async_trait]
impl SlotStorage for MemorySlot {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(StoreError::Slot {
                key: key.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "Simulated write error"),
            });
        }
        self.values.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
