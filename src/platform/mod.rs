mod discord;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use discord::{DiscordPlatform, EventRouter};

/// What the bot knows about a server member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    /// The member's display name in the server (nickname, global name or username)
    pub display_name: String,
    /// When the member joined the server, if known
    pub joined_at: Option<DateTime<Utc>>,
}

/// A chat message as seen by the commands and the help channel tracker
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// The id of the user who sent the message
    pub author_id: String,
    /// Whether the author is a bot account
    pub author_is_bot: bool,
    /// The channel the message was sent in
    pub channel_id: String,
    /// The server the message was sent in, if any
    pub guild_id: Option<String>,
    /// The raw text of the message
    pub content: String,
    /// The author's member record, when the event carried one
    pub member: Option<MemberInfo>,
}

/// Operations the bot needs from the chat platform
///
/// Every id is the platform's identifier rendered as a string, so the rest of the
/// bot never has to know which platform it is talking to.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Send a text message to a channel
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<()>;

    /// Change the name of a channel
    async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<()>;

    /// Fetch the current name of a channel
    async fn channel_name(&self, channel_id: &str) -> Result<String>;

    /// Look up a member of a server
    ///
    /// # Returns
    /// `Ok(None)` if the user is not a member of the server
    async fn lookup_member(&self, guild_id: &str, user_id: &str) -> Result<Option<MemberInfo>>;
}
