use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::commands::Command;
use crate::platform::{ChatPlatform, IncomingMessage, MemberInfo};

const USER_NOT_FOUND: &str = "Could not find specified user";
const LOOKUP_FAILED: &str = "Lifetime command failed. Blame the discord API, probably.";

/// Render a join date the way it is shown in replies
fn format_join_date(joined_at: Option<DateTime<Utc>>) -> String {
    match joined_at {
        Some(joined_at) => joined_at.format("%a %b %d %Y %H:%M:%S UTC").to_string(),
        None => "an unknown date".to_string(),
    }
}

/// Turn a mention like `<@!1234>` into a bare user id
fn strip_mention(target: &str) -> String {
    target
        .chars()
        .filter(|c| !matches!(c, '<' | '!' | '@' | '>'))
        .collect()
}

/// Tells a member how long they've belonged to the server
pub struct LifetimeCommand {
    platform: Arc<dyn ChatPlatform>,
    server_name: String,
}

impl LifetimeCommand {
    /// Create a new lifetime command
    ///
    /// # Arguments
    /// * `platform` - Used to look up server members
    /// * `server_name` - Shown when the command is used outside a server
    pub fn new(platform: Arc<dyn ChatPlatform>, server_name: String) -> Self {
        LifetimeCommand {
            platform,
            server_name,
        }
    }

    async fn lookup(&self, guild_id: &str, user_id: &str) -> Option<MemberInfo> {
        match self.platform.lookup_member(guild_id, user_id).await {
            Ok(member) => member,
            Err(e) => {
                debug!("Member lookup for {} failed: {}", user_id, e);
                None
            }
        }
    }

    fn self_reply(member: &MemberInfo) -> String {
        format!(
            "{}, you have been a member of this server since {}.",
            member.display_name,
            format_join_date(member.joined_at)
        )
    }
}

#[async_trait]
impl Command for LifetimeCommand {
    async fn execute(&self, msg: &IncomingMessage, args: Vec<&str>) -> Result<Option<String>> {
        let Some(guild_id) = msg.guild_id.as_deref() else {
            return Ok(Some(format!(
                "You can only use this in the {} server.",
                self.server_name
            )));
        };

        if let Some(target) = args.first() {
            let user_id = strip_mention(target);

            let reply = match self.lookup(guild_id, &user_id).await {
                Some(member) => format!(
                    "{} has been a member of this server since {}.",
                    member.display_name,
                    format_join_date(member.joined_at)
                ),
                None => USER_NOT_FOUND.to_string(),
            };

            return Ok(Some(reply));
        }

        // The event usually carries the member record already
        if let Some(member) = &msg.member {
            if member.joined_at.is_some() && !member.display_name.is_empty() {
                return Ok(Some(Self::self_reply(member)));
            }
        }

        let reply = match self.lookup(guild_id, &msg.author_id).await {
            Some(member) => Self::self_reply(&member),
            None => LOOKUP_FAILED.to_string(),
        };

        Ok(Some(reply))
    }

    fn help(&self) -> &str {
        "Shows how long you (or a mentioned member) have been in the server. Usage: {prefix}lifetime [@member]"
    }
}
