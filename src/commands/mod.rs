mod handler;
mod basic;
mod done;
mod lifetime;
mod resources;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use anyhow::Result;

use crate::platform::IncomingMessage;

pub use handler::CommandHandler;
pub use basic::HelpCommand;
pub use done::{DONE_COMMAND, DoneCommand};
pub use lifetime::LifetimeCommand;
pub use resources::ResourcesCommand;

/// Trait for defining chat commands
#[async_trait]
pub trait Command: Send + Sync {
    /// Execute the command based on a chat message
    ///
    /// # Arguments
    /// * `msg` - The chat message that triggered the command
    /// * `args` - The arguments provided to the command, without the command name
    ///
    /// # Returns
    /// A string response to send to the chat, or None if no response is needed
    async fn execute(&self, msg: &IncomingMessage, args: Vec<&str>) -> Result<Option<String>>;

    /// Get the help text for this command
    ///
    /// `{prefix}` is replaced with the configured command prefix when the text is shown.
    fn help(&self) -> &str;
}

/// A registry of available commands
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a new empty command registry
    pub fn new() -> Self {
        CommandRegistry {
            commands: HashMap::new(),
        }
    }

    /// Register a command with the given name
    ///
    /// # Arguments
    /// * `name` - The name of the command (without prefix)
    /// * `command` - The command implementation
    pub fn register<S: Into<String>>(&mut self, name: S, command: Arc<dyn Command>) {
        self.commands.insert(name.into(), command);
    }

    /// Get a command from the registry
    ///
    /// # Returns
    /// Some(command) if the command exists, None otherwise
    pub fn get_command<S: AsRef<str>>(&self, name: S) -> Option<Arc<dyn Command>> {
        self.commands.get(name.as_ref()).cloned()
    }

    /// Name and help text of every registered command, sorted by name
    pub fn descriptions(&self) -> Vec<(String, String)> {
        let mut descriptions: Vec<(String, String)> = self
            .commands
            .iter()
            .map(|(name, command)| (name.clone(), command.help().to_string()))
            .collect();
        descriptions.sort();
        descriptions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::create_test_message;
    use std::sync::Arc;

    struct TestCommand;

    #[async_trait]
    impl Command for TestCommand {
        async fn execute(&self, _msg: &IncomingMessage, args: Vec<&str>) -> Result<Option<String>> {
            Ok(Some(format!("Test command executed with {} args", args.len())))
        }

        fn help(&self) -> &str {
            "A test command"
        }
    }

    #[test]
    fn test_command_registry() {
        let mut registry = CommandRegistry::new();
        let cmd = Arc::new(TestCommand);

        // Register command
        registry.register("test", cmd);

        // Get command
        assert!(registry.get_command("test").is_some());
        assert!(registry.get_command("unknown").is_none());
    }

    #[test]
    fn test_descriptions_are_sorted() {
        let mut registry = CommandRegistry::new();
        registry.register("zeta", Arc::new(TestCommand));
        registry.register("alpha", Arc::new(TestCommand));

        let names: Vec<String> = registry
            .descriptions()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_registered_command_executes() {
        let mut registry = CommandRegistry::new();
        registry.register("test", Arc::new(TestCommand));

        let msg = create_test_message("u1", "c1", "!test a b");
        let command = registry.get_command("test").unwrap();
        let result = command.execute(&msg, vec!["a", "b"]).await.unwrap();

        assert_eq!(result, Some("Test command executed with 2 args".to_string()));
    }
}
