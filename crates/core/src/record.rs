//! Completion records - what each user has memorized.

use crate::id::UserId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A single verse, written as `"chapter:verse"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerseRef {
    /// 1-based chapter index
    pub chapter: i64,
    /// 1-based verse number within the chapter
    pub verse: i64,
}

impl VerseRef {
    /// Create a new verse reference.
    pub fn new(chapter: i64, verse: i64) -> Self {
        Self { chapter, verse }
    }
}

impl fmt::Display for VerseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chapter, self.verse)
    }
}

/// Error returned when a string is not a `"chapter:verse"` pair.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid verse reference '{0}', expected 'chapter:verse'")]
pub struct ParseVerseRefError(String);

impl FromStr for VerseRef {
    type Err = ParseVerseRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseVerseRefError(s.to_string());
        let (chapter, verse) = s.split_once(':').ok_or_else(err)?;
        Ok(Self {
            chapter: chapter.trim().parse().map_err(|_| err())?,
            verse: verse.trim().parse().map_err(|_| err())?,
        })
    }
}

impl Serialize for VerseRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VerseRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Every verse a user has marked complete, in insertion order.
///
/// Duplicates are kept; only the length is used for metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// Completed verses
    #[serde(default)]
    pub completed: Vec<VerseRef>,
}

impl CompletionRecord {
    /// Number of completed entries.
    pub fn len(&self) -> usize {
        self.completed.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }
}

/// The persisted aggregate: user ID to completion record.
pub type ProgressData = BTreeMap<UserId, CompletionRecord>;
