//! JSON file storage implementation.
//!
//! Stores the whole progress map as one pretty-printed JSON object
//! (`{"<user id>": {"completed": ["chapter:verse", ...]}}`). Every save
//! rewrites the file through a temporary sibling and a rename, so a crash
//! mid-write leaves the previous contents in place.

use std::path::{Path, PathBuf};
use hifz_core::ProgressData;
use super::{RetryPolicy, Storage, StorageError, Result};
use tokio::fs;
use tracing::debug;

/// Default file name, relative to the working directory.
pub const DEFAULT_PROGRESS_FILE: &str = "progress.json";

/// File-based JSON storage backend.
pub struct JsonStorage {
    path: PathBuf,
    retry: RetryPolicy,
}

impl JsonStorage {
    /// Create storage backed by the file at `path`. The file is not touched
    /// until the first load or save.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            retry: RetryPolicy::default(),
        }
    }

    /// Set the retry policy used for writes.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn write_once(&self, json: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let temp = self.temp_path();
        fs::write(&temp, json.as_bytes()).await?;
        fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn load(&self) -> Result<ProgressData> {
        match fs::read_to_string(&self.path).await {
            Ok(json) => {
                let data: ProgressData = serde_json::from_str(&json)?;
                debug!("Loaded progress for {} users from {}", data.len(), self.path.display());
                Ok(data)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No progress file at {}, starting empty", self.path.display());
                Ok(ProgressData::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, data: &ProgressData) -> Result<()> {
        // Serialization errors are deterministic, only I/O is retried
        let json = serde_json::to_string_pretty(data)?;
        let json = json.as_str();
        self.retry
            .run(
                "Writing progress file",
                |e: &StorageError| matches!(e, StorageError::Io(_)),
                move || self.write_once(json),
            )
            .await?;
        debug!("Saved progress for {} users to {}", data.len(), self.path.display());
        Ok(())
    }
}
