//! In-memory storage, used by tests.

use async_trait::async_trait;
use hifz_core::ProgressData;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

use super::{Result, Storage, StorageError};

/// Storage that keeps the last saved map in memory.
#[derive(Default)]
pub struct MemoryStorage {
    data: Mutex<ProgressData>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage that already holds `data`.
    pub fn with_data(data: ProgressData) -> Self {
        Self {
            data: Mutex::new(data),
            ..Self::default()
        }
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Copy of the last saved map.
    pub async fn stored(&self) -> ProgressData {
        self.data.lock().await.clone()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn load(&self) -> Result<ProgressData> {
        Ok(self.data.lock().await.clone())
    }

    async fn save(&self, data: &ProgressData) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Other("simulated write failure".to_string()));
        }
        *self.data.lock().await = data.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
