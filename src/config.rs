use anyhow::Result;
use dotenv::dotenv;
use std::env;
use std::time::Duration;

use crate::commands::DONE_COMMAND;
use crate::help_channels::TrackerSettings;

/// Default busy window for help channels (10 minutes)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 600_000;
/// Default suffix added to busy help channels
pub const DEFAULT_BUSY_SUFFIX: &str = "__busy";
/// Default server name used in "wrong server" replies
pub const DEFAULT_SERVER_NAME: &str = "/r/unity";

/// Configuration for the Discord bot
pub struct Config {
    /// The bot token used to log in to Discord
    pub discord_token: String,
    /// Ids of the channels tracked as help channels
    pub help_channel_ids: Vec<String>,
    /// How long a help channel stays busy without activity, in milliseconds
    pub busy_timeout_ms: u64,
    /// The suffix added to the name of busy help channels
    pub busy_suffix: String,
    /// Users allowed to mark any help channel as done
    pub helper_user_ids: Vec<String>,
    /// The server name shown when a command is used outside of it
    pub server_name: String,
}

/// Split a comma separated list of ids, dropping empty entries
pub fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Returns
    /// A Result containing the Config if successful, or an error if required variables are missing
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN")
            .ok_or_else(|| anyhow::anyhow!("DISCORD_TOKEN environment variable not set"))?;

        let help_channel_ids = lookup("HELP_CHANNEL_IDS")
            .map(|raw| parse_id_list(&raw))
            .unwrap_or_default();

        let busy_timeout_ms = match lookup("HELP_CHANNEL_BUSY_TIMEOUT_MS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                anyhow::anyhow!("HELP_CHANNEL_BUSY_TIMEOUT_MS must be a number of milliseconds, got {:?}", raw)
            })?,
            None => DEFAULT_BUSY_TIMEOUT_MS,
        };

        let busy_suffix = lookup("HELP_CHANNEL_BUSY_SUFFIX")
            .unwrap_or_else(|| DEFAULT_BUSY_SUFFIX.to_string());

        let helper_user_ids = lookup("HELPER_USER_IDS")
            .map(|raw| parse_id_list(&raw))
            .unwrap_or_default();

        let server_name =
            lookup("SERVER_NAME").unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string());

        Ok(Config {
            discord_token,
            help_channel_ids,
            busy_timeout_ms,
            busy_suffix,
            helper_user_ids,
            server_name,
        })
    }

    /// Create a new config directly from values, using defaults for the rest (useful for testing)
    #[cfg(test)]
    pub fn new(discord_token: String, help_channel_ids: Vec<String>, busy_timeout_ms: u64) -> Self {
        Config {
            discord_token,
            help_channel_ids,
            busy_timeout_ms,
            busy_suffix: DEFAULT_BUSY_SUFFIX.to_string(),
            helper_user_ids: Vec::new(),
            server_name: DEFAULT_SERVER_NAME.to_string(),
        }
    }

    /// Settings for the help channel tracker
    ///
    /// The done trigger is the done command under the given command prefix.
    pub fn tracker_settings(&self, prefix: &str) -> TrackerSettings {
        TrackerSettings {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            busy_suffix: self.busy_suffix.clone(),
            done_trigger: format!("{}{}", prefix, DONE_COMMAND),
        }
    }
}
