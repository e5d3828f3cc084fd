use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::commands::Command;
use crate::help_channels::HelpChannelTracker;
use crate::platform::IncomingMessage;

/// Name the done command is registered under
pub const DONE_COMMAND: &str = "done";

const MARKED_FREE: &str = "Channel marked as free.";
const NOT_ALLOWED: &str = "Only the member who asked can mark this channel as done.";

/// Marks a busy help channel as free again
pub struct DoneCommand {
    tracker: HelpChannelTracker,
    helper_user_ids: Vec<String>,
}

impl DoneCommand {
    /// Create a new done command
    ///
    /// # Arguments
    /// * `tracker` - The help channel tracker
    /// * `helper_user_ids` - Users who may free any help channel
    pub fn new(tracker: HelpChannelTracker, helper_user_ids: Vec<String>) -> Self {
        DoneCommand {
            tracker,
            helper_user_ids,
        }
    }
}

#[async_trait]
impl Command for DoneCommand {
    async fn execute(&self, msg: &IncomingMessage, _args: Vec<&str>) -> Result<Option<String>> {
        // Nothing to do in free or untracked channels
        if !self.tracker.is_busy(&msg.channel_id).await {
            return Ok(None);
        }

        // The culprit is unknown for channels recovered after a restart
        let is_culprit = self
            .tracker
            .culprit(&msg.channel_id)
            .await
            .is_none_or(|culprit| culprit == msg.author_id);
        let is_helper = self.helper_user_ids.contains(&msg.author_id);

        if !is_culprit && !is_helper {
            return Ok(Some(NOT_ALLOWED.to_string()));
        }

        info!("{} marked help channel {} as done", msg.author_id, msg.channel_id);
        self.tracker.mark_not_busy(&msg.channel_id).await;

        Ok(Some(MARKED_FREE.to_string()))
    }

    fn help(&self) -> &str {
        "Marks the help channel you asked in as free. Usage: {prefix}done"
    }
}
