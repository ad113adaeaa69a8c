use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Slot I/O failed for {key:?}: {source}")]
    Slot {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode review collection: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Invalid slot key {0:?}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
