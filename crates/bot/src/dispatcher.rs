//! Command dispatcher: routes slash commands to the progress store, the
//! metrics and the reminder scheduler, and builds the reply.

use std::collections::HashMap;
use std::sync::Arc;

use hifz_core::{name as surah_name, PeriodError, ReminderPeriod, UserId};
use hifz_progress::{HifzEstimate, ProgressError, ProgressReport, ProgressStore};
use hifz_reminder::{Notifier, ReminderScheduler};
use hifz_storage::Storage;
use tracing::{debug, info, warn};

use crate::relay::{self, RelayOutcome};

/// Reply sent when the remind command gets an unsupported unit.
pub const INVALID_UNIT_REPLY: &str = "Invalid time unit. Please use 'minutes' or 'hours'.";

/// Reply sent when a change was applied but could not be written to disk.
pub const NOT_SAVED_REPLY: &str =
    "Your progress was recorded but could not be saved right now. It will be saved with your next update.";

/// A typed command argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Integer option
    Integer(i64),
    /// String option
    String(String),
}

/// Arguments of one command invocation, by option name.
#[derive(Debug, Clone, Default)]
pub struct CommandArgs {
    values: HashMap<String, ArgValue>,
}

impl CommandArgs {
    /// Create an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument.
    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.insert(name.into(), value);
    }

    /// Add an integer argument.
    pub fn with_integer(mut self, name: impl Into<String>, value: i64) -> Self {
        self.insert(name, ArgValue::Integer(value));
        self
    }

    /// Add a string argument.
    pub fn with_string(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, ArgValue::String(value.into()));
        self
    }

    /// Required integer argument.
    pub fn integer(&self, name: &str) -> Result<i64, DispatchError> {
        match self.values.get(name) {
            Some(ArgValue::Integer(v)) => Ok(*v),
            Some(_) => Err(DispatchError::InvalidArgument {
                name: name.to_string(),
                expected: "integer",
            }),
            None => Err(DispatchError::MissingArgument(name.to_string())),
        }
    }

    /// Required string argument.
    pub fn string(&self, name: &str) -> Result<&str, DispatchError> {
        match self.values.get(name) {
            Some(ArgValue::String(v)) => Ok(v.as_str()),
            Some(_) => Err(DispatchError::InvalidArgument {
                name: name.to_string(),
                expected: "string",
            }),
            None => Err(DispatchError::MissingArgument(name.to_string())),
        }
    }
}

/// Errors turning a raw invocation into a typed one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// No command with this name
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// A required option was not supplied
    #[error("Missing required option '{0}'")]
    MissingArgument(String),

    /// An option had the wrong type
    #[error("Option '{name}' must be a {expected}")]
    InvalidArgument {
        /// Option name
        name: String,
        /// Expected type
        expected: &'static str,
    },
}

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    /// Mark one verse as completed
    Complete {
        /// Chapter index
        chapter: i64,
        /// Verse number
        verse: i64,
    },
    /// Mark whole chapters as memorized
    Memorized {
        /// First chapter, inclusive
        start_chapter: i64,
        /// Last chapter, inclusive
        end_chapter: i64,
    },
    /// Show Juzz and percentage completed
    Progress,
    /// Estimate time to finish
    HifzCalc {
        /// Time the user needs for one Juzz
        time_for_juzz: i64,
    },
    /// Set a recurring reminder
    Remind {
        /// Amount of `unit` between reminders
        time: i64,
        /// `minutes` or `hours`
        unit: String,
    },
    /// List the commands
    Help,
}

impl Invocation {
    /// Build an invocation from a command name and its options.
    pub fn parse(name: &str, args: &CommandArgs) -> Result<Self, DispatchError> {
        match name {
            "complete" => Ok(Invocation::Complete {
                chapter: args.integer("chapter")?,
                verse: args.integer("verse")?,
            }),
            "memorized" => Ok(Invocation::Memorized {
                start_chapter: args.integer("start_chapter")?,
                end_chapter: args.integer("end_chapter")?,
            }),
            "progress" => Ok(Invocation::Progress),
            "hifzcalc" => Ok(Invocation::HifzCalc {
                time_for_juzz: args.integer("time_for_juzz")?,
            }),
            "remind" => Ok(Invocation::Remind {
                time: args.integer("time")?,
                unit: args.string("unit")?.to_string(),
            }),
            "help" => Ok(Invocation::Help),
            other => Err(DispatchError::UnknownCommand(other.to_string())),
        }
    }

    /// Command name.
    pub fn name(&self) -> &'static str {
        match self {
            Invocation::Complete { .. } => "complete",
            Invocation::Memorized { .. } => "memorized",
            Invocation::Progress => "progress",
            Invocation::HifzCalc { .. } => "hifzcalc",
            Invocation::Remind { .. } => "remind",
            Invocation::Help => "help",
        }
    }
}

/// An embed-style reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedReply {
    /// Optional title
    pub title: Option<String>,
    /// Body text
    pub description: String,
    /// `(name, value)` fields
    pub fields: Vec<(String, String)>,
}

impl EmbedReply {
    fn text(description: impl Into<String>) -> Self {
        Self {
            title: None,
            description: description.into(),
            fields: Vec::new(),
        }
    }
}

/// What to send back to the invoking user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Plain message, used for validation errors
    Plain(String),
    /// Rich embed
    Embed(EmbedReply),
}

impl Reply {
    /// Main text of the reply.
    pub fn text(&self) -> &str {
        match self {
            Reply::Plain(text) => text.as_str(),
            Reply::Embed(embed) => embed.description.as_str(),
        }
    }
}

/// Routes invocations to the progress store, metrics and reminders.
pub struct CommandDispatcher<S: Storage, N: Notifier> {
    progress: Arc<ProgressStore<S>>,
    reminders: Arc<ReminderScheduler<N>>,
    notifier: Arc<N>,
}

impl<S: Storage, N: Notifier + 'static> CommandDispatcher<S, N> {
    /// Create a dispatcher over shared components.
    pub fn new(
        progress: Arc<ProgressStore<S>>,
        reminders: Arc<ReminderScheduler<N>>,
        notifier: Arc<N>,
    ) -> Self {
        Self {
            progress,
            reminders,
            notifier,
        }
    }

    /// The progress store.
    pub fn progress(&self) -> &ProgressStore<S> {
        &self.progress
    }

    /// The reminder scheduler.
    pub fn reminders(&self) -> &ReminderScheduler<N> {
        &self.reminders
    }

    /// Parse and handle a raw command.
    pub async fn dispatch(&self, user: &UserId, name: &str, args: &CommandArgs) -> Reply {
        match Invocation::parse(name, args) {
            Ok(invocation) => self.handle(user, invocation).await,
            Err(e) => {
                warn!("Rejected command '{}' from user {}: {}", name, user, e);
                Reply::Plain(e.to_string())
            }
        }
    }

    /// Handle a typed command for `user`.
    pub async fn handle(&self, user: &UserId, invocation: Invocation) -> Reply {
        info!("Handling /{} for user {}", invocation.name(), user);
        match invocation {
            Invocation::Complete { chapter, verse } => self.complete(user, chapter, verse).await,
            Invocation::Memorized {
                start_chapter,
                end_chapter,
            } => self.memorized(user, start_chapter, end_chapter).await,
            Invocation::Progress => self.show_progress(user).await,
            Invocation::HifzCalc { time_for_juzz } => self.hifz_calc(user, time_for_juzz).await,
            Invocation::Remind { time, unit } => self.remind(user, time, &unit).await,
            Invocation::Help => help(),
        }
    }

    /// Forward a relayed direct message.
    pub async fn relay(&self, target: Option<&UserId>, body: &str) -> RelayOutcome {
        relay::relay(self.notifier.as_ref(), target, body).await
    }

    async fn complete(&self, user: &UserId, chapter: i64, verse: i64) -> Reply {
        if chapter < 1 || verse < 1 {
            return Reply::Plain("Chapter and verse must be positive numbers.".to_string());
        }
        let saved = self.progress.record_verse(user, chapter, verse).await;
        confirm(
            saved,
            format!(
                "You have marked Surah {} as completed at verse {}.",
                surah_name(chapter),
                verse
            ),
        )
    }

    async fn memorized(&self, user: &UserId, start: i64, end: i64) -> Reply {
        if start < 1 || end < 1 {
            return Reply::Plain("Chapters must be positive numbers.".to_string());
        }
        let saved = self.progress.record_range(user, start, end).await;
        confirm(
            saved,
            format!(
                "You have marked Surahs {} to {} as memorized.",
                surah_name(start),
                surah_name(end)
            ),
        )
    }

    async fn show_progress(&self, user: &UserId) -> Reply {
        let report = ProgressReport::for_count(self.progress.completed_count(user).await);
        debug!("Progress for user {}: {:?}", user, report);
        Reply::Embed(EmbedReply {
            title: Some("Your Progress".to_string()),
            description: format!(
                "You have completed approximately {:.2} Juzz ({:.2}% of the Qur'an).",
                report.juzz, report.percent
            ),
            fields: Vec::new(),
        })
    }

    async fn hifz_calc(&self, user: &UserId, time_for_juzz: i64) -> Reply {
        if time_for_juzz < 0 {
            return Reply::Plain("Time for one Juzz cannot be negative.".to_string());
        }
        let estimate = HifzEstimate::new(self.progress.completed_count(user).await, time_for_juzz);
        Reply::Embed(EmbedReply::text(format!(
            "You have approximately {:.2} Juzz remaining. Based on your time, you will need approximately {:.2} units of time to finish.",
            estimate.remaining_juzz, estimate.estimated_time
        )))
    }

    async fn remind(&self, user: &UserId, time: i64, unit: &str) -> Reply {
        let period = match ReminderPeriod::parse(time, unit) {
            Ok(period) => period,
            Err(PeriodError::InvalidUnit(_)) => return Reply::Plain(INVALID_UNIT_REPLY.to_string()),
            Err(PeriodError::NonPositive(_)) => {
                return Reply::Plain("Reminder interval must be at least 1.".to_string())
            }
        };
        self.reminders.schedule(user, period).await;
        Reply::Embed(EmbedReply::text(format!(
            "You will be reminded every {} to continue your Hifz in your DMs.",
            period
        )))
    }
}

fn confirm(saved: hifz_progress::Result<usize>, message: String) -> Reply {
    match saved {
        Ok(_) => Reply::Embed(EmbedReply::text(message)),
        Err(ProgressError::Persist(_)) => Reply::Plain(NOT_SAVED_REPLY.to_string()),
        Err(e) => Reply::Plain(e.to_string()),
    }
}

fn help() -> Reply {
    let fields = [
        (
            "/complete",
            "Mark a verse as completed. **Usage:** `/complete chapter: [number] verse: [number]`",
        ),
        (
            "/memorized",
            "Mark Surahs as memorized. **Usage:** `/memorized start_chapter: [number] end_chapter: [number]`",
        ),
        ("/progress", "Shows memorization progress based on Juzz and percentage."),
        (
            "/hifzcalc",
            "Calculate how much time you need to memorize the remaining Qur'an. **Usage:** `/hifzcalc time_for_juzz: [number]`",
        ),
        (
            "/remind",
            "Set reminders to memorize. **Usage:** `/remind time: [number] unit: [minutes/hours]`",
        ),
    ];
    Reply::Embed(EmbedReply {
        title: Some("Available Commands".to_string()),
        description: "Here are the available commands:".to_string(),
        fields: fields
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hifz_reminder::NotifyError;
    use hifz_storage::MemoryStorage;
    use std::time::Duration;

    #[derive(Default)]
    struct NullNotifier;

    #[async_trait]
    impl Notifier for NullNotifier {
        async fn send_direct(&self, _user: &UserId, _content: &str) -> Result<(), NotifyError> {
            Ok(())
        }
    }

    async fn dispatcher_with(
        storage: Arc<MemoryStorage>,
    ) -> CommandDispatcher<Arc<MemoryStorage>, NullNotifier> {
        let notifier = Arc::new(NullNotifier);
        CommandDispatcher::new(
            Arc::new(ProgressStore::load(storage).await.unwrap()),
            Arc::new(ReminderScheduler::new(notifier.clone())),
            notifier,
        )
    }

    async fn dispatcher() -> CommandDispatcher<Arc<MemoryStorage>, NullNotifier> {
        dispatcher_with(Arc::new(MemoryStorage::new())).await
    }

    fn user() -> UserId {
        UserId::new("1001")
    }

    #[test]
    fn test_parse_all_commands() {
        let args = CommandArgs::new()
            .with_integer("chapter", 2)
            .with_integer("verse", 5);
        assert_eq!(
            Invocation::parse("complete", &args).unwrap(),
            Invocation::Complete { chapter: 2, verse: 5 }
        );

        let args = CommandArgs::new()
            .with_integer("time", 5)
            .with_string("unit", "minutes");
        assert_eq!(
            Invocation::parse("remind", &args).unwrap(),
            Invocation::Remind { time: 5, unit: "minutes".to_string() }
        );

        assert_eq!(
            Invocation::parse("progress", &CommandArgs::new()).unwrap(),
            Invocation::Progress
        );
        assert_eq!(Invocation::parse("help", &CommandArgs::new()).unwrap(), Invocation::Help);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Invocation::parse("teleport", &CommandArgs::new()),
            Err(DispatchError::UnknownCommand("teleport".to_string()))
        );
        assert_eq!(
            Invocation::parse("hifzcalc", &CommandArgs::new()),
            Err(DispatchError::MissingArgument("time_for_juzz".to_string()))
        );
        let args = CommandArgs::new().with_string("chapter", "two").with_integer("verse", 1);
        assert!(matches!(
            Invocation::parse("complete", &args),
            Err(DispatchError::InvalidArgument { .. })
        ));
    }

    #[tokio::test]
    async fn test_complete_records_and_confirms() {
        let d = dispatcher().await;
        let reply = d
            .handle(&user(), Invocation::Complete { chapter: 2, verse: 255 })
            .await;

        assert_eq!(
            reply.text(),
            "You have marked Surah Al-Baqarah as completed at verse 255."
        );
        assert_eq!(d.progress().completed_count(&user()).await, 1);
    }

    #[tokio::test]
    async fn test_complete_unknown_chapter_uses_sentinel_name() {
        let d = dispatcher().await;
        let reply = d
            .handle(&user(), Invocation::Complete { chapter: 40, verse: 1 })
            .await;
        assert_eq!(
            reply.text(),
            "You have marked Surah Unknown Surah as completed at verse 1."
        );
    }

    #[tokio::test]
    async fn test_complete_rejects_non_positive() {
        let d = dispatcher().await;
        let reply = d
            .handle(&user(), Invocation::Complete { chapter: 0, verse: 1 })
            .await;
        assert!(matches!(reply, Reply::Plain(_)));
        assert_eq!(d.progress().completed_count(&user()).await, 0);
    }

    #[tokio::test]
    async fn test_memorized_then_progress() {
        let d = dispatcher().await;
        let reply = d
            .handle(&user(), Invocation::Memorized { start_chapter: 1, end_chapter: 1 })
            .await;
        assert_eq!(reply.text(), "You have marked Surahs Al-Fatiha to Al-Fatiha as memorized.");
        assert_eq!(d.progress().completed_count(&user()).await, 7);

        let reply = d.handle(&user(), Invocation::Progress).await;
        match reply {
            Reply::Embed(embed) => {
                assert_eq!(embed.title.as_deref(), Some("Your Progress"));
                assert_eq!(
                    embed.description,
                    "You have completed approximately 0.01 Juzz (0.89% of the Qur'an)."
                );
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_progress_is_read_only() {
        let storage = Arc::new(MemoryStorage::new());
        let d = dispatcher_with(storage.clone()).await;

        d.handle(&user(), Invocation::Progress).await;
        d.handle(&user(), Invocation::HifzCalc { time_for_juzz: 3 }).await;

        assert_eq!(storage.save_count(), 0);
        assert!(d.progress().snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_hifzcalc_with_nothing_completed() {
        let d = dispatcher().await;
        let reply = d
            .handle(&user(), Invocation::HifzCalc { time_for_juzz: 10 })
            .await;
        assert_eq!(
            reply.text(),
            "You have approximately 30.00 Juzz remaining. Based on your time, you will need approximately 300.00 units of time to finish."
        );
    }

    #[tokio::test]
    async fn test_hifzcalc_past_full_coverage() {
        let d = dispatcher().await;
        for _ in 0..24 {
            d.handle(&user(), Invocation::Memorized { start_chapter: 1, end_chapter: 5 })
                .await;
        }
        assert_eq!(d.progress().completed_count(&user()).await, 789 * 24);

        let reply = d
            .handle(&user(), Invocation::HifzCalc { time_for_juzz: 0 })
            .await;
        assert_eq!(
            reply.text(),
            "You have approximately -1.35 Juzz remaining. Based on your time, you will need approximately 0.00 units of time to finish."
        );

        let reply = d
            .handle(&user(), Invocation::HifzCalc { time_for_juzz: 2 })
            .await;
        assert_eq!(
            reply.text(),
            "You have approximately -1.35 Juzz remaining. Based on your time, you will need approximately -2.70 units of time to finish."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_remind_replaces_previous_reminder() {
        let d = dispatcher().await;

        let reply = d
            .handle(&user(), Invocation::Remind { time: 5, unit: "minutes".to_string() })
            .await;
        assert_eq!(
            reply.text(),
            "You will be reminded every 5 minutes to continue your Hifz in your DMs."
        );

        d.handle(&user(), Invocation::Remind { time: 1, unit: "hours".to_string() })
            .await;

        assert_eq!(d.reminders().active_count().await, 1);
        let active = d.reminders().active(&user()).await.unwrap();
        assert_eq!(active.period.duration(), Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remind_invalid_unit_leaves_existing_timer() {
        let d = dispatcher().await;
        d.handle(&user(), Invocation::Remind { time: 5, unit: "minutes".to_string() })
            .await;
        let before = d.reminders().active(&user()).await.unwrap();

        let reply = d
            .handle(&user(), Invocation::Remind { time: 5, unit: "days".to_string() })
            .await;

        assert_eq!(reply, Reply::Plain(INVALID_UNIT_REPLY.to_string()));
        assert_eq!(d.reminders().active(&user()).await, Some(before));
    }

    #[tokio::test]
    async fn test_remind_invalid_unit_creates_nothing() {
        let d = dispatcher().await;
        let reply = d
            .handle(&user(), Invocation::Remind { time: 5, unit: "days".to_string() })
            .await;
        assert_eq!(reply, Reply::Plain(INVALID_UNIT_REPLY.to_string()));
        assert_eq!(d.reminders().active_count().await, 0);
    }

    #[tokio::test]
    async fn test_remind_zero_interval_is_rejected() {
        let d = dispatcher().await;
        let reply = d
            .handle(&user(), Invocation::Remind { time: 0, unit: "hours".to_string() })
            .await;
        assert!(matches!(reply, Reply::Plain(_)));
        assert_eq!(d.reminders().active_count().await, 0);
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported_not_lost() {
        let storage = Arc::new(MemoryStorage::new());
        let d = dispatcher_with(storage.clone()).await;
        storage.set_fail_writes(true);

        let reply = d
            .handle(&user(), Invocation::Complete { chapter: 1, verse: 1 })
            .await;

        assert_eq!(reply, Reply::Plain(NOT_SAVED_REPLY.to_string()));
        assert_eq!(d.progress().completed_count(&user()).await, 1);
    }

    #[tokio::test]
    async fn test_help_lists_commands() {
        let d = dispatcher().await;
        let Reply::Embed(embed) = d.handle(&user(), Invocation::Help).await else {
            panic!("help should be an embed");
        };
        let names: Vec<&str> = embed.fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            ["/complete", "/memorized", "/progress", "/hifzcalc", "/remind"]
        );
    }

    #[tokio::test]
    async fn test_dispatch_reports_parse_errors() {
        let d = dispatcher().await;
        let reply = d.dispatch(&user(), "complete", &CommandArgs::new()).await;
        assert_eq!(reply, Reply::Plain("Missing required option 'chapter'".to_string()));
    }
}
