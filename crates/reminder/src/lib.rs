//! Reminder scheduling.
//!
//! One recurring timer per user that sends a direct message through a
//! [`Notifier`] every period.

#![warn(missing_docs)]

pub mod notifier;
pub mod scheduler;

pub use notifier::{Notifier, NotifyError};
pub use scheduler::{ActiveReminder, ReminderScheduler, REMINDER_MESSAGE};
