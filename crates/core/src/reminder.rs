//! Reminder periods.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Unit of a reminder period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderUnit {
    /// Minutes
    Minutes,
    /// Hours
    Hours,
}

impl ReminderUnit {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderUnit::Minutes => "minutes",
            ReminderUnit::Hours => "hours",
        }
    }

    fn seconds(&self) -> u64 {
        match self {
            ReminderUnit::Minutes => 60,
            ReminderUnit::Hours => 60 * 60,
        }
    }
}

impl fmt::Display for ReminderUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors building a reminder period from user input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    /// Unit is neither `minutes` nor `hours`
    #[error("invalid time unit '{0}'")]
    InvalidUnit(String),

    /// Amount is zero or negative
    #[error("reminder interval must be at least 1, got {0}")]
    NonPositive(i64),
}

impl FromStr for ReminderUnit {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minutes" => Ok(ReminderUnit::Minutes),
            "hours" => Ok(ReminderUnit::Hours),
            other => Err(PeriodError::InvalidUnit(other.to_string())),
        }
    }
}

/// How often a reminder fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReminderPeriod {
    /// Number of units between firings (at least 1)
    pub amount: u64,
    /// Unit of `amount`
    pub unit: ReminderUnit,
}

impl ReminderPeriod {
    /// Build a period, rejecting non-positive amounts.
    pub fn new(amount: i64, unit: ReminderUnit) -> Result<Self, PeriodError> {
        match u64::try_from(amount) {
            Ok(amount) if amount > 0 => Ok(Self { amount, unit }),
            _ => Err(PeriodError::NonPositive(amount)),
        }
    }

    /// Parse the `(time, unit)` pair given to the remind command.
    ///
    /// The unit is checked first so an unknown unit is always reported as such.
    pub fn parse(amount: i64, unit: &str) -> Result<Self, PeriodError> {
        let unit = unit.parse()?;
        Self::new(amount, unit)
    }

    /// Period as a duration. Saturates instead of overflowing.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.amount.saturating_mul(self.unit.seconds()))
    }
}

impl fmt::Display for ReminderPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.unit)
    }
}
