//! Discord implementation of the chat platform
//!
//! REST operations go through serenity's [`Http`] client, while gateway events are
//! received by [`EventRouter`] and handed to the command handler and the help channel
//! tracker.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::all::{
    ChannelId, Context, EditChannel, EventHandler, GuildId, Message, Ready, Timestamp, UserId,
};
use serenity::http::Http;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::commands::CommandHandler;
use crate::help_channels::HelpChannelTracker;
use crate::platform::{ChatPlatform, IncomingMessage, MemberInfo};

/// Parse a Discord snowflake from its string form
fn parse_snowflake(kind: &str, raw: &str) -> Result<u64> {
    let id: u64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow!("Invalid {} id: {:?}", kind, raw))?;

    if id == 0 {
        return Err(anyhow!("Invalid {} id: 0", kind));
    }

    Ok(id)
}

fn to_utc(timestamp: Timestamp) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.unix_timestamp(), 0)
}

/// Chat platform backed by the Discord REST API
#[derive(Clone)]
pub struct DiscordPlatform {
    http: Arc<Http>,
}

impl DiscordPlatform {
    /// Create a new Discord platform using the given bot token
    pub fn new(token: &str) -> Self {
        DiscordPlatform {
            http: Arc::new(Http::new(token)),
        }
    }
}

#[async_trait]
impl ChatPlatform for DiscordPlatform {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<()> {
        let channel = ChannelId::new(parse_snowflake("channel", channel_id)?);
        channel.say(self.http.as_ref(), text).await?;
        debug!("Sent message to channel {}", channel_id);
        Ok(())
    }

    async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<()> {
        let channel = ChannelId::new(parse_snowflake("channel", channel_id)?);
        channel
            .edit(self.http.as_ref(), EditChannel::new().name(name))
            .await?;
        debug!("Renamed channel {} to {}", channel_id, name);
        Ok(())
    }

    async fn channel_name(&self, channel_id: &str) -> Result<String> {
        let channel = ChannelId::new(parse_snowflake("channel", channel_id)?);
        let channel = channel.to_channel(self.http.as_ref()).await?;

        channel
            .guild()
            .map(|guild_channel| guild_channel.name)
            .ok_or_else(|| anyhow!("Channel {} is not a server channel", channel_id))
    }

    async fn lookup_member(&self, guild_id: &str, user_id: &str) -> Result<Option<MemberInfo>> {
        let guild = GuildId::new(parse_snowflake("guild", guild_id)?);

        // Anything that isn't a snowflake can't name a member
        let Ok(user) = parse_snowflake("user", user_id) else {
            return Ok(None);
        };

        let member = guild.member(self.http.as_ref(), UserId::new(user)).await?;

        Ok(Some(MemberInfo {
            display_name: member.display_name().to_string(),
            joined_at: member.joined_at.and_then(to_utc),
        }))
    }
}

/// Convert a serenity message into the bot's own message type
fn incoming_from(msg: &Message) -> IncomingMessage {
    let member = msg.member.as_ref().map(|partial| MemberInfo {
        display_name: partial
            .nick
            .clone()
            .or_else(|| msg.author.global_name.clone())
            .unwrap_or_else(|| msg.author.name.clone()),
        joined_at: partial.joined_at.and_then(to_utc),
    });

    IncomingMessage {
        author_id: msg.author.id.to_string(),
        author_is_bot: msg.author.bot,
        channel_id: msg.channel_id.to_string(),
        guild_id: msg.guild_id.map(|guild| guild.to_string()),
        content: msg.content.clone(),
        member,
    }
}

/// Gateway event handler that feeds every message to the commands and the tracker
pub struct EventRouter {
    commands: Arc<CommandHandler>,
    tracker: HelpChannelTracker,
}

impl EventRouter {
    /// Create a new event router
    ///
    /// # Arguments
    /// * `commands` - The command handler for prefixed commands
    /// * `tracker` - The help channel tracker that sees every message
    pub fn new(commands: Arc<CommandHandler>, tracker: HelpChannelTracker) -> Self {
        EventRouter { commands, tracker }
    }

    /// Route a single message
    ///
    /// Commands run first so that a done command frees the channel before the tracker
    /// sees the same message, which it then ignores.
    pub async fn route(&self, msg: &IncomingMessage) {
        if msg.author_is_bot {
            return;
        }

        if let Err(e) = self.commands.handle_message(msg).await {
            error!("Error handling command: {}", e);
        }

        self.tracker.handle_message(msg).await;
    }
}

#[async_trait]
impl EventHandler for EventRouter {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Connected to Discord as {}", ready.user.name);
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        debug!("[CHAT] {}: {}", msg.author.name, msg.content);
        self.route(&incoming_from(&msg)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandRegistry, DONE_COMMAND, DoneCommand};
    use crate::test_helpers::{MockPlatform, create_test_config, create_test_message, settle};
    use tokio::sync::RwLock;

    #[test]
    fn test_parse_snowflake() {
        assert_eq!(parse_snowflake("channel", "123456789").unwrap(), 123456789);
        assert_eq!(parse_snowflake("channel", " 42 ").unwrap(), 42);
        assert!(parse_snowflake("channel", "0").is_err());
        assert!(parse_snowflake("channel", "<#123>").is_err());
        assert!(parse_snowflake("channel", "").is_err());
    }

    /// Wire a router the way `start_bot` does, with the done command registered
    async fn create_router(
        platform: Arc<MockPlatform>,
        prefix: &str,
    ) -> (EventRouter, HelpChannelTracker) {
        let config = create_test_config();
        let tracker =
            HelpChannelTracker::new(platform.clone(), config.tracker_settings(prefix)).unwrap();
        tracker.start(&["c1".to_string()]).await;

        let mut registry = CommandRegistry::new();
        registry.register(
            DONE_COMMAND,
            Arc::new(DoneCommand::new(tracker.clone(), Vec::new())),
        );

        let commands = Arc::new(CommandHandler::new(
            platform,
            Arc::new(RwLock::new(registry)),
            prefix.to_string(),
        ));

        (EventRouter::new(commands, tracker.clone()), tracker)
    }

    #[tokio::test]
    async fn test_route_ignores_bots() {
        let platform = Arc::new(MockPlatform::new());
        platform.add_channel("c1", "1_help");
        let (router, tracker) = create_router(platform.clone(), "!").await;

        let mut msg = create_test_message("u1", "c1", "hello");
        msg.author_is_bot = true;
        router.route(&msg).await;
        settle().await;

        assert!(!tracker.is_busy("c1").await);
        assert!(platform.renames().is_empty());
        tracker.stop().await;
    }

    #[tokio::test]
    async fn test_route_forwards_plain_messages_to_tracker() {
        let platform = Arc::new(MockPlatform::new());
        platform.add_channel("c1", "1_help");
        let (router, tracker) = create_router(platform.clone(), "!").await;

        router.route(&create_test_message("u1", "c1", "hello")).await;
        settle().await;

        assert!(tracker.is_busy("c1").await);
        assert_eq!(platform.channel("c1").as_deref(), Some("1_help__busy"));
        tracker.stop().await;
    }

    #[tokio::test]
    async fn test_done_command_leaves_channel_free() {
        let cases = [
            ("!", "!done"),
            ("?", "?done"),
            ("!", "   !done"),
            ("!", "!DONE thanks"),
            ("bot ", "bot done"),
        ];

        for (prefix, done) in cases {
            let platform = Arc::new(MockPlatform::new());
            platform.add_channel("c1", "1_help");
            let (router, tracker) = create_router(platform.clone(), prefix).await;

            router.route(&create_test_message("u1", "c1", "how do I x")).await;
            router.route(&create_test_message("u1", "c1", done)).await;
            settle().await;

            assert!(!tracker.is_busy("c1").await, "{:?} with prefix {:?}", done, prefix);
            assert!(tracker.culprit("c1").await.is_none());
            assert_eq!(platform.channel("c1").as_deref(), Some("1_help"));
            assert!(
                platform
                    .sent()
                    .contains(&("c1".to_string(), "Channel marked as free.".to_string()))
            );
            tracker.stop().await;
        }
    }

    #[tokio::test]
    async fn test_other_prefix_done_is_an_ordinary_message() {
        let platform = Arc::new(MockPlatform::new());
        platform.add_channel("c1", "1_help");
        let (router, tracker) = create_router(platform.clone(), "?").await;

        router.route(&create_test_message("u1", "c1", "how do I x")).await;
        router.route(&create_test_message("u1", "c1", "!done")).await;
        settle().await;

        assert!(tracker.is_busy("c1").await);
        assert_eq!(platform.channel("c1").as_deref(), Some("1_help__busy"));
        assert!(platform.sent().is_empty());
        tracker.stop().await;
    }
}
