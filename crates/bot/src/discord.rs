//! Discord gateway glue.
//!
//! Registers the slash commands, turns interactions into [`CommandArgs`]
//! for the dispatcher and renders its [`Reply`] as Discord messages.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use hifz_core::UserId;
use hifz_progress::ProgressStore;
use hifz_reminder::{Notifier, NotifyError, ReminderScheduler};
use hifz_storage::{JsonStorage, RetryPolicy, Storage};
use serenity::all::{
    Client, Colour, CommandDataOptionValue, CommandInteraction, CommandOptionType, Context,
    CreateCommand, CreateCommandOption, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseMessage, CreateMessage, EventHandler, GatewayIntents, GuildId, Http,
    Interaction, Message, Ready, UserId as DiscordUserId,
};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::dispatcher::{ArgValue, CommandArgs, CommandDispatcher, EmbedReply, Reply};
use crate::relay::parse_relay;

/// Sends direct messages through the Discord REST API.
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    /// Create a notifier over an authenticated HTTP client.
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send_direct(&self, user: &UserId, content: &str) -> Result<(), NotifyError> {
        let id = user
            .as_str()
            .parse::<u64>()
            .ok()
            .filter(|id| *id != 0)
            .ok_or_else(|| NotifyError::UnknownUser(user.to_string()))?;

        let channel = DiscordUserId::new(id)
            .create_dm_channel(self.http.as_ref())
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        channel
            .send_message(self.http.as_ref(), CreateMessage::new().content(content))
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        Ok(())
    }
}

/// Gateway event handler.
pub struct Handler<S: Storage> {
    dispatcher: Arc<CommandDispatcher<S, DiscordNotifier>>,
    guild_id: GuildId,
}

impl<S: Storage> Handler<S> {
    /// Create a handler that registers its commands in `guild_id`.
    pub fn new(dispatcher: Arc<CommandDispatcher<S, DiscordNotifier>>, guild_id: GuildId) -> Self {
        Self {
            dispatcher,
            guild_id,
        }
    }
}

#[async_trait]
impl<S: Storage + 'static> EventHandler for Handler<S> {
    async fn ready(&self, ctx: Context, ready: Ready) {
        match self.guild_id.set_commands(&ctx.http, command_definitions()).await {
            Ok(commands) => info!(
                "Registered {} commands in guild {}",
                commands.len(),
                self.guild_id
            ),
            Err(e) => error!("Failed to register commands in guild {}: {}", self.guild_id, e),
        }
        info!("{} is online!", ready.user.tag());
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };

        let user = UserId::from(command.user.id.get());
        let args = command_args(&command);
        let reply = self
            .dispatcher
            .dispatch(&user, &command.data.name, &args)
            .await;

        let response = CreateInteractionResponse::Message(response_message(reply));
        if let Err(e) = command.create_response(&ctx.http, response).await {
            warn!("Failed to answer /{} for user {}: {}", command.data.name, user, e);
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(body) = parse_relay(&msg.content) else {
            return;
        };
        debug!("Relay requested by user {}", msg.author.id);

        let target = msg.mentions.first().map(|u| UserId::from(u.id.get()));
        let outcome = self.dispatcher.relay(target.as_ref(), &body).await;

        let sent = if outcome.is_usage_error() {
            msg.reply(&ctx.http, outcome.reply_text()).await.map(|_| ())
        } else {
            msg.channel_id
                .say(&ctx.http, outcome.reply_text())
                .await
                .map(|_| ())
        };
        if let Err(e) = sent {
            warn!("Failed to answer relay request: {}", e);
        }
    }
}

fn command_args(command: &CommandInteraction) -> CommandArgs {
    let mut args = CommandArgs::new();
    for option in &command.data.options {
        match &option.value {
            CommandDataOptionValue::Integer(v) => {
                args.insert(option.name.clone(), ArgValue::Integer(*v))
            }
            CommandDataOptionValue::String(v) => {
                args.insert(option.name.clone(), ArgValue::String(v.clone()))
            }
            other => debug!("Ignoring option '{}' of kind {:?}", option.name, other.kind()),
        }
    }
    args
}

fn response_message(reply: Reply) -> CreateInteractionResponseMessage {
    match reply {
        Reply::Plain(text) => CreateInteractionResponseMessage::new().content(text),
        Reply::Embed(embed) => CreateInteractionResponseMessage::new().embed(render_embed(embed)),
    }
}

fn render_embed(reply: EmbedReply) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .colour(random_colour())
        .description(reply.description);
    if let Some(title) = reply.title {
        embed = embed.title(title);
    }
    embed.fields(reply.fields.into_iter().map(|(name, value)| (name, value, false)))
}

fn random_colour() -> Colour {
    Colour::new(rand::random::<u32>() & 0x00FF_FFFF)
}

fn integer_option(name: &str, description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::Integer, name, description).required(true)
}

/// Slash commands registered in the guild.
pub fn command_definitions() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new("complete")
            .description("Mark a verse as completed.")
            .add_option(integer_option("chapter", "Chapter number"))
            .add_option(integer_option("verse", "Verse number")),
        CreateCommand::new("memorized")
            .description("Mark Surahs as memorized from start to end chapter.")
            .add_option(integer_option("start_chapter", "Start chapter number"))
            .add_option(integer_option("end_chapter", "End chapter number")),
        CreateCommand::new("progress")
            .description("Shows memorization progress based on Juzz and percentage of Qur'an."),
        CreateCommand::new("hifzcalc")
            .description("Calculate how much time you need to memorize the remaining Qur'an.")
            .add_option(integer_option("time_for_juzz", "Time it took you to memorize 1 Juzz")),
        CreateCommand::new("remind")
            .description("Set reminders to memorize.")
            .add_option(integer_option("time", "How much time between reminders"))
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "unit",
                    "Unit of time (minutes/hours)",
                )
                .required(true),
            ),
        CreateCommand::new("help").description("Get a list of available commands."),
    ]
}

/// Load progress, connect to Discord and run until the gateway closes or
/// the process receives Ctrl-C.
pub async fn run(config: Config) -> Result<()> {
    let storage = JsonStorage::new(&config.progress_file)
        .with_retry(RetryPolicy::default().with_attempts(config.write_attempts));
    let progress = ProgressStore::load(storage).await.with_context(|| {
        format!(
            "Failed to load progress file {}",
            config.progress_file.display()
        )
    })?;

    let notifier = Arc::new(DiscordNotifier::new(Arc::new(Http::new(&config.token))));
    let reminders = Arc::new(ReminderScheduler::new(notifier.clone()));
    let dispatcher = Arc::new(CommandDispatcher::new(
        Arc::new(progress),
        reminders.clone(),
        notifier,
    ));
    let handler = Handler::new(dispatcher, GuildId::new(config.guild_id));

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS;
    let mut client = Client::builder(&config.token, intents)
        .event_handler(handler)
        .await
        .context("Failed to create Discord client")?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
            shard_manager.shutdown_all().await;
        }
    });

    info!("Connecting to Discord");
    let result = client.start().await.context("Discord client stopped");
    reminders.shutdown().await;
    result
}
