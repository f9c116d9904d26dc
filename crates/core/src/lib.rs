//! Hifz core data models.
//!
//! This crate defines the reference table of chapters and the records that
//! track each user's memorization progress.

#![warn(missing_docs)]

// Identities
mod id;

// Reference data
mod surah;

// Progress records
mod record;

// Reminder periods
mod reminder;

// Re-exports
pub use id::{ReminderId, UserId};
pub use surah::{
    name, surah, verse_count, Surah, CHAPTER_COUNT, SURAHS, TOTAL_VERSES, UNKNOWN_SURAH,
};
pub use record::{CompletionRecord, ParseVerseRefError, ProgressData, VerseRef};
pub use reminder::{PeriodError, ReminderPeriod, ReminderUnit};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
