//! Storage abstraction trait

use async_trait::async_trait;
use broadsheet_core::AppError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(key),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Durable file storage keyed by relative path.
///
/// Writes must be atomic with respect to readers: a key is either absent,
/// holds its previous content, or holds the complete new content.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read the full content stored under `key`.
    async fn read(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Store `data` under `key`, replacing any previous content.
    async fn write(&self, key: &str, data: &[u8]) -> StorageResult<()>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;
}
