// Store trait for durable string blobs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store key `{0}`")]
    InvalidKey(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// String-keyed blob store. Writes replace the whole value for a key.
pub trait KeyValueStore: Send + Sync {
    /// Read the blob stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the blob stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
