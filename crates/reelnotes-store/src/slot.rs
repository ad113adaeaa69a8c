use async_trait::async_trait;

use crate::error::Result;

/// A durable key-value location holding one serialized blob per key.
///
/// The review store keeps its whole collection under a single key and always
/// replaces it wholesale, so implementations only need whole-value reads and
/// writes.
#[async_trait]
pub trait SlotStorage: Send + Sync {
    /// Current value of `key`, or `None` if it was never written.
    async fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value of `key`.
    async fn write(&self, key: &str, value: &str) -> Result<()>;
}

#[async_trait]
impl<T: SlotStorage + ?Sized> SlotStorage for std::sync::Arc<T> {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value).await
    }
}
