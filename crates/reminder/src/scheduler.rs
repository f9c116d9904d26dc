//! Per-user recurring reminders.

use hifz_core::{ReminderId, ReminderPeriod, Time, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::Notifier;

/// Message sent on every reminder firing.
pub const REMINDER_MESSAGE: &str = "Time to continue memorizing your Qur'an!";

// Used when `now + period` does not fit in an Instant
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Public view of a user's active reminder.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveReminder {
    /// Issued on every (re)schedule
    pub id: ReminderId,
    /// Time between firings
    pub period: ReminderPeriod,
    /// When the reminder was scheduled
    pub scheduled_at: Time,
    /// Failed sends since the last successful one
    pub consecutive_failures: u32,
}

struct Entry {
    id: ReminderId,
    period: ReminderPeriod,
    scheduled_at: Time,
    failures: Arc<AtomicU32>,
    task: JoinHandle<()>,
}

impl Entry {
    fn view(&self) -> ActiveReminder {
        ActiveReminder {
            id: self.id,
            period: self.period,
            scheduled_at: self.scheduled_at,
            consecutive_failures: self.failures.load(Ordering::SeqCst),
        }
    }
}

/// Keeps at most one recurring reminder per user.
///
/// Each reminder is its own task. Scheduling again for the same user aborts
/// the old task first. Sends are fire-and-forget: a failed send is logged and
/// counted, and the reminder keeps firing.
pub struct ReminderScheduler<N: Notifier> {
    notifier: Arc<N>,
    message: String,
    reminders: Mutex<HashMap<UserId, Entry>>,
}

impl<N: Notifier + 'static> ReminderScheduler<N> {
    /// Create a scheduler that sends [`REMINDER_MESSAGE`] through `notifier`.
    pub fn new(notifier: Arc<N>) -> Self {
        Self {
            notifier,
            message: REMINDER_MESSAGE.to_string(),
            reminders: Mutex::new(HashMap::new()),
        }
    }

    /// Use a different reminder message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Start a reminder for `user`, replacing any existing one.
    ///
    /// The first message is sent one full period from now.
    pub async fn schedule(&self, user: &UserId, period: ReminderPeriod) -> ReminderId {
        let id = ReminderId::new();
        let failures = Arc::new(AtomicU32::new(0));
        let task = tokio::spawn(run_reminder(
            self.notifier.clone(),
            user.clone(),
            self.message.clone(),
            period.duration(),
            failures.clone(),
        ));

        let entry = Entry {
            id,
            period,
            scheduled_at: chrono::Utc::now(),
            failures,
            task,
        };

        let mut reminders = self.reminders.lock().await;
        if let Some(old) = reminders.insert(user.clone(), entry) {
            old.task.abort();
            debug!("Replaced reminder {} for user {}", old.id, user);
        }
        info!("Reminder {} set for user {} every {}", id, user, period);
        id
    }

    /// Stop the user's reminder. Returns false when there was none.
    pub async fn cancel(&self, user: &UserId) -> bool {
        match self.reminders.lock().await.remove(user) {
            Some(entry) => {
                entry.task.abort();
                info!("Reminder {} for user {} cancelled", entry.id, user);
                true
            }
            None => false,
        }
    }

    /// The user's active reminder, if any.
    pub async fn active(&self, user: &UserId) -> Option<ActiveReminder> {
        self.reminders.lock().await.get(user).map(Entry::view)
    }

    /// Number of users with an active reminder.
    pub async fn active_count(&self) -> usize {
        self.reminders.lock().await.len()
    }

    /// Cancel every reminder.
    pub async fn shutdown(&self) {
        let mut reminders = self.reminders.lock().await;
        for (_, entry) in reminders.drain() {
            entry.task.abort();
        }
        debug!("All reminders cancelled");
    }
}

impl<N: Notifier> Drop for ReminderScheduler<N> {
    fn drop(&mut self) {
        for entry in self.reminders.get_mut().values() {
            entry.task.abort();
        }
    }
}

async fn run_reminder<N: Notifier + 'static>(
    notifier: Arc<N>,
    user: UserId,
    message: String,
    period: Duration,
    failures: Arc<AtomicU32>,
) {
    let now = Instant::now();
    let start = now
        .checked_add(period)
        .unwrap_or_else(|| now + FAR_FUTURE);
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        // A slow send must not hold up the next tick
        let notifier = notifier.clone();
        let user = user.clone();
        let message = message.clone();
        let failures = failures.clone();
        tokio::spawn(async move {
            match notifier.send_direct(&user, &message).await {
                Ok(()) => {
                    failures.store(0, Ordering::SeqCst);
                    debug!("Reminder sent to user {}", user);
                }
                Err(e) => {
                    let count = failures.fetch_add(1, Ordering::SeqCst) + 1;
                    warn!(
                        "Reminder to user {} failed ({} in a row): {}",
                        user, count, e
                    );
                }
            }
        });
    }
}
