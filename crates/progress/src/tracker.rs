//! Progress store: completed verses per user.

use hifz_core::{CompletionRecord, ProgressData, UserId, VerseRef, CHAPTER_COUNT};
use hifz_storage::{Storage, StorageError};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Error type for progress operations.
pub type Result<T> = std::result::Result<T, ProgressError>;

/// Errors that can occur while loading or saving progress.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// The persisted store exists but could not be read
    #[error("failed to load progress: {0}")]
    Load(#[source] StorageError),

    /// The change was applied in memory but writing it out failed
    #[error("progress recorded but not saved: {0}")]
    Persist(#[source] StorageError),
}

/// Every verse of chapters `start..=end`, in order.
///
/// Chapters outside the reference table contribute nothing, and an inverted
/// range is empty.
pub fn range_entries(start: i64, end: i64) -> Vec<VerseRef> {
    let first = start.max(1);
    let last = end.min(CHAPTER_COUNT);
    (first..=last)
        .flat_map(|chapter| {
            let count = hifz_core::verse_count(chapter) as i64;
            (1..=count).map(move |verse| VerseRef::new(chapter, verse))
        })
        .collect()
}

/// Durable mapping from user to completed verses.
///
/// Loaded once at startup; every mutation rewrites the whole store. The
/// mutation and its write happen under one lock, so concurrent commands are
/// applied one at a time.
pub struct ProgressStore<S: Storage> {
    storage: S,
    data: Mutex<ProgressData>,
}

impl<S: Storage> ProgressStore<S> {
    /// Load the store from `storage`. A missing store starts empty.
    pub async fn load(storage: S) -> Result<Self> {
        let data = storage.load().await.map_err(ProgressError::Load)?;
        info!("Loaded progress for {} users", data.len());
        Ok(Self {
            storage,
            data: Mutex::new(data),
        })
    }

    /// Append one verse to the user's record. Returns the number of
    /// entries appended (always 1).
    pub async fn record_verse(&self, user: &UserId, chapter: i64, verse: i64) -> Result<usize> {
        self.append(user, vec![VerseRef::new(chapter, verse)]).await
    }

    /// Append every verse of chapters `start..=end`. Returns the number of
    /// entries appended.
    pub async fn record_range(&self, user: &UserId, start: i64, end: i64) -> Result<usize> {
        self.append(user, range_entries(start, end)).await
    }

    /// Number of entries in the user's record, 0 if they have none.
    pub async fn completed_count(&self, user: &UserId) -> usize {
        self.data
            .lock()
            .await
            .get(user)
            .map_or(0, CompletionRecord::len)
    }

    /// Write the full store to storage.
    pub async fn persist(&self) -> Result<()> {
        let data = self.data.lock().await;
        self.write(&data).await
    }

    /// Copy of the current in-memory store.
    pub async fn snapshot(&self) -> ProgressData {
        self.data.lock().await.clone()
    }

    async fn append(&self, user: &UserId, entries: Vec<VerseRef>) -> Result<usize> {
        let mut data = self.data.lock().await;
        let appended = entries.len();
        data.entry(user.clone())
            .or_default()
            .completed
            .extend(entries);
        debug!("Recorded {} verses for user {}", appended, user);

        // The change stays in memory even if the write fails; the next
        // successful write includes it.
        self.write(&data).await?;
        Ok(appended)
    }

    async fn write(&self, data: &ProgressData) -> Result<()> {
        self.storage.save(data).await.map_err(|e| {
            error!("Failed to save progress: {}", e);
            ProgressError::Persist(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hifz_storage::{JsonStorage, MemoryStorage};
    use std::sync::Arc;

    fn user() -> UserId {
        UserId::new("u1")
    }

    async fn empty_store() -> ProgressStore<Arc<MemoryStorage>> {
        ProgressStore::load(Arc::new(MemoryStorage::new())).await.unwrap()
    }

    #[tokio::test]
    async fn test_unknown_user_has_zero() {
        let store = empty_store().await;
        assert_eq!(store.completed_count(&user()).await, 0);
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_record_verse_increments_by_one() {
        let store = empty_store().await;
        store.record_range(&user(), 1, 1).await.unwrap();
        let before = store.completed_count(&user()).await;

        let appended = store.record_verse(&user(), 2, 255).await.unwrap();

        assert_eq!(appended, 1);
        assert_eq!(store.completed_count(&user()).await, before + 1);
    }

    #[tokio::test]
    async fn test_record_verse_keeps_duplicates() {
        let store = empty_store().await;
        store.record_verse(&user(), 1, 1).await.unwrap();
        store.record_verse(&user(), 1, 1).await.unwrap();
        assert_eq!(store.completed_count(&user()).await, 2);
    }

    #[tokio::test]
    async fn test_record_verse_does_not_validate_bounds() {
        let store = empty_store().await;
        store.record_verse(&user(), 99, 1000).await.unwrap();

        let data = store.snapshot().await;
        assert_eq!(data[&user()].completed, vec![VerseRef::new(99, 1000)]);
    }

    #[tokio::test]
    async fn test_record_range_single_chapter() {
        let store = empty_store().await;
        let appended = store.record_range(&user(), 1, 1).await.unwrap();

        assert_eq!(appended, 7);
        assert_eq!(store.completed_count(&user()).await, 7);
        let data = store.snapshot().await;
        assert_eq!(data[&user()].completed.first(), Some(&VerseRef::new(1, 1)));
        assert_eq!(data[&user()].completed.last(), Some(&VerseRef::new(1, 7)));
    }

    #[tokio::test]
    async fn test_record_range_appends_sum_of_verse_counts() {
        let store = empty_store().await;
        let appended = store.record_range(&user(), 2, 4).await.unwrap();
        assert_eq!(appended, 286 + 200 + 176);

        let appended = store.record_range(&user(), 1, 5).await.unwrap();
        assert_eq!(appended, 789);
    }

    #[tokio::test]
    async fn test_record_range_inverted_is_empty() {
        let store = empty_store().await;
        let appended = store.record_range(&user(), 3, 2).await.unwrap();

        assert_eq!(appended, 0);
        assert_eq!(store.completed_count(&user()).await, 0);
        // The record still exists, as in the persisted file
        assert!(store.snapshot().await.contains_key(&user()));
    }

    #[tokio::test]
    async fn test_record_range_skips_chapters_outside_table() {
        let store = empty_store().await;
        assert_eq!(store.record_range(&user(), 5, 114).await.unwrap(), 120);
        assert_eq!(store.record_range(&user(), -10, 1).await.unwrap(), 7);
        assert_eq!(store.record_range(&user(), 6, i64::MAX).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_every_mutation_is_persisted() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ProgressStore::load(storage.clone()).await.unwrap();

        store.record_verse(&user(), 1, 1).await.unwrap();
        store.record_range(&user(), 1, 1).await.unwrap();

        assert_eq!(storage.save_count(), 2);
        assert_eq!(storage.stored().await, store.snapshot().await);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_change_in_memory() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ProgressStore::load(storage.clone()).await.unwrap();

        storage.set_fail_writes(true);
        let result = store.record_verse(&user(), 1, 1).await;
        assert!(matches!(result, Err(ProgressError::Persist(_))));
        assert_eq!(store.completed_count(&user()).await, 1);
        assert!(storage.stored().await.is_empty());

        // Next successful write carries the earlier change too
        storage.set_fail_writes(false);
        store.record_verse(&user(), 1, 2).await.unwrap();
        assert_eq!(storage.stored().await[&user()].len(), 2);
    }

    #[tokio::test]
    async fn test_persist_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");

        let store = ProgressStore::load(JsonStorage::new(&path)).await.unwrap();
        store.record_range(&UserId::new("a"), 1, 2).await.unwrap();
        store.record_verse(&UserId::new("b"), 3, 4).await.unwrap();
        store.persist().await.unwrap();
        let persisted = store.snapshot().await;

        let reloaded = ProgressStore::load(JsonStorage::new(&path)).await.unwrap();
        assert_eq!(reloaded.snapshot().await, persisted);
        assert_eq!(reloaded.completed_count(&UserId::new("a")).await, 293);
    }

    #[tokio::test]
    async fn test_load_fails_on_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let result = ProgressStore::load(JsonStorage::new(&path)).await;
        assert!(matches!(result, Err(ProgressError::Load(_))));
    }

    #[tokio::test]
    async fn test_concurrent_mutations_are_all_applied() {
        let store = Arc::new(empty_store().await);
        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.record_verse(&UserId::new("shared"), 1, i).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.completed_count(&UserId::new("shared")).await, 20);
    }
}
