//! Identifiers for users and reminders.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Opaque identifier of a chat-platform user.
///
/// Stored as a string because it is the key of the persisted progress map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Unique identifier for one scheduled reminder.
///
/// A new ID is issued every time a reminder is (re)scheduled, so a replaced
/// reminder can be told apart from its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReminderId(Ulid);

impl ReminderId {
    /// Generate a new ReminderId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ReminderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReminderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
