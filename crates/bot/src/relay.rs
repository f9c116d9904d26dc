//! `!botdm` text command: forward a message to a mentioned user.

use std::sync::OnceLock;

use hifz_core::UserId;
use hifz_reminder::Notifier;
use regex::Regex;
use tracing::{info, warn};

/// Prefix of the relay command.
pub const RELAY_PREFIX: &str = "!botdm";

static RELAY_COMMAND: OnceLock<Regex> = OnceLock::new();
static SPACES: OnceLock<Regex> = OnceLock::new();

fn relay_command() -> &'static Regex {
    RELAY_COMMAND.get_or_init(|| {
        let pattern = format!(r"(?s)^{}(?:\s+(?P<rest>.*))?$", regex::escape(RELAY_PREFIX));
        Regex::new(&pattern).expect("regex for relay command")
    })
}

fn spaces() -> &'static Regex {
    SPACES.get_or_init(|| Regex::new(r" +").expect("regex for spaces"))
}

/// Result of a relay attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// No user was mentioned
    NoMention,
    /// Nothing to send after the mention
    EmptyMessage,
    /// Message delivered
    Sent,
    /// Delivery failed
    Failed,
}

impl RelayOutcome {
    /// Text to post back in the channel.
    pub fn reply_text(&self) -> &'static str {
        match self {
            RelayOutcome::NoMention => "Please mention a valid user.",
            RelayOutcome::EmptyMessage => "Please provide a message to send.",
            RelayOutcome::Sent => "Message sent successfully.",
            RelayOutcome::Failed => "Failed to send the message.",
        }
    }

    /// Whether the reply should quote the original message. Problems with
    /// the command itself are answered as replies, delivery results are
    /// posted to the channel.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, RelayOutcome::NoMention | RelayOutcome::EmptyMessage)
    }
}

/// Extract the message body from a `!botdm @user message...` command.
///
/// Returns `None` when `content` is not a relay command. The first word
/// after the prefix is taken to be the mention and dropped; runs of spaces
/// in the rest collapse to one.
pub fn parse_relay(content: &str) -> Option<String> {
    let captures = relay_command().captures(content)?;
    let rest = captures.name("rest").map_or("", |m| m.as_str()).trim();
    let words: Vec<&str> = spaces().split(rest).collect();
    Some(words.get(1..).unwrap_or_default().join(" "))
}

/// Send `body` to `target`.
pub async fn relay<N: Notifier + ?Sized>(
    notifier: &N,
    target: Option<&UserId>,
    body: &str,
) -> RelayOutcome {
    let Some(target) = target else {
        return RelayOutcome::NoMention;
    };
    if body.is_empty() {
        return RelayOutcome::EmptyMessage;
    }
    match notifier.send_direct(target, body).await {
        Ok(()) => {
            info!("Relayed a message to user {}", target);
            RelayOutcome::Sent
        }
        Err(e) => {
            warn!("Failed to relay a message to user {}: {}", target, e);
            RelayOutcome::Failed
        }
    }
}
