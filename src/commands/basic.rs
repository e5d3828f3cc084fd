use anyhow::Result;
use async_trait::async_trait;

use crate::commands::Command;
use crate::platform::IncomingMessage;

/// A command that displays help information for all commands
pub struct HelpCommand {
    prefix: String,
    descriptions: Vec<(String, String)>,
}

impl HelpCommand {
    /// Create a new help command
    ///
    /// # Arguments
    /// * `prefix` - The command prefix (e.g., "!")
    /// * `descriptions` - A list of (command_name, help_text) pairs
    ///
    /// # Returns
    /// A new HelpCommand instance
    pub fn new(prefix: String, descriptions: Vec<(String, String)>) -> Self {
        HelpCommand {
            prefix,
            descriptions,
        }
    }
}

#[async_trait]
impl Command for HelpCommand {
    async fn execute(&self, _msg: &IncomingMessage, args: Vec<&str>) -> Result<Option<String>> {
        let Some(requested) = args.first() else {
            // Show a list of all commands
            let commands: Vec<String> = self
                .descriptions
                .iter()
                .map(|(name, _)| format!("{}{}", self.prefix, name))
                .collect();

            return Ok(Some(format!("Available commands: {}", commands.join(", "))));
        };

        // Show help for a specific command, with or without the prefix
        let requested = requested.trim_start_matches(self.prefix.as_str()).to_lowercase();

        if let Some((_, help)) = self
            .descriptions
            .iter()
            .find(|(name, _)| name.to_lowercase() == requested)
        {
            Ok(Some(help.replace("{prefix}", &self.prefix)))
        } else {
            Ok(Some(format!("Unknown command: {}{}", self.prefix, requested)))
        }
    }

    fn help(&self) -> &str {
        "Shows help information for available commands. Usage: {prefix}help [command]"
    }
}
