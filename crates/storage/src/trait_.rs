//! Storage trait abstraction.

use async_trait::async_trait;
use hifz_core::ProgressData;
use std::sync::Arc;

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Durable home of the progress map.
///
/// The whole map is read at startup and rewritten on every save.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Load the persisted map. A missing store yields an empty map.
    async fn load(&self) -> Result<ProgressData>;

    /// Overwrite the persisted map with `data`.
    async fn save(&self, data: &ProgressData) -> Result<()>;
}

#[async_trait]
impl<S: Storage + ?Sized> Storage for Arc<S> {
    async fn load(&self) -> Result<ProgressData> {
        (**self).load().await
    }

    async fn save(&self, data: &ProgressData) -> Result<()> {
        (**self).save(data).await
    }
}
