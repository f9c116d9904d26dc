//! Hifz bot - Discord front end for memorization progress tracking.
//!
//! [`dispatcher`] and [`relay`] hold the platform-neutral command handling;
//! [`discord`] wires them to the Discord gateway.

#![warn(missing_docs)]

pub mod config;
pub mod dispatcher;
pub mod relay;
pub mod discord;

pub use config::Config;
pub use dispatcher::{
    ArgValue, CommandArgs, CommandDispatcher, DispatchError, EmbedReply, Invocation, Reply,
};
pub use relay::{parse_relay, RelayOutcome, RELAY_PREFIX};
pub use discord::{run, DiscordNotifier, Handler};
