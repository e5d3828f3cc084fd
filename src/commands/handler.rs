use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, debug, error};

use crate::commands::CommandRegistry;
use crate::platform::{ChatPlatform, IncomingMessage};

/// Longest message Discord accepts, in characters
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Split a reply into messages no longer than `limit` characters
///
/// Splits happen on line boundaries where possible; a single line longer than the limit
/// is cut into pieces.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.chars().count();
        let needed = if current.is_empty() { line_len } else { line_len + 1 };

        if current_len + needed > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > limit {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Handler for processing incoming chat messages and executing commands
pub struct CommandHandler {
    client: Arc<dyn ChatPlatform>,
    registry: Arc<RwLock<CommandRegistry>>,
    prefix: String,
}

impl CommandHandler {
    /// Create a new command handler
    ///
    /// # Arguments
    /// * `client` - The chat platform for sending messages
    /// * `registry` - The registry of available commands
    /// * `prefix` - The command prefix (e.g., "!")
    ///
    /// # Returns
    /// A new CommandHandler instance
    pub fn new(
        client: Arc<dyn ChatPlatform>,
        registry: Arc<RwLock<CommandRegistry>>,
        prefix: String,
    ) -> Self {
        CommandHandler {
            client,
            registry,
            prefix,
        }
    }

    /// Process an incoming chat message
    ///
    /// # Arguments
    /// * `msg` - The chat message to process
    ///
    /// # Returns
    /// A Result indicating whether the reply could be sent
    pub async fn handle_message(&self, msg: &IncomingMessage) -> Result<()> {
        let content = msg.content.trim();

        // Check if the message is a command (starts with the prefix)
        let Some(without_prefix) = content.strip_prefix(self.prefix.as_str()) else {
            return Ok(());
        };

        // Parse the command name and arguments
        let parts: Vec<&str> = without_prefix.split_whitespace().collect();

        if parts.is_empty() {
            return Ok(());
        }

        let command_name = parts[0].to_lowercase();
        let args = parts[1..].to_vec();

        // Get the command from the registry
        let command = {
            let registry = self.registry.read().await;
            registry.get_command(&command_name)
        };

        let Some(command) = command else {
            debug!("Unknown command: {}", command_name);
            return Ok(());
        };

        match command.execute(msg, args).await {
            Ok(Some(response)) => {
                info!("Executing command: {}", command_name);
                for chunk in split_message(&response, MAX_MESSAGE_LENGTH) {
                    self.client.send_message(&msg.channel_id, &chunk).await?;
                }
            }
            Ok(None) => {
                // No response needed
                debug!("Command executed with no response: {}", command_name);
            }
            Err(e) => {
                // Command execution failed
                error!("Command execution failed: {}", e);
            }
        }

        Ok(())
    }
}
