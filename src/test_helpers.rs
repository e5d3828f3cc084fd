#![allow(dead_code)]
/// Test helpers for unit tests
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::config::Config;
use crate::platform::{ChatPlatform, IncomingMessage, MemberInfo};

/// In-memory chat platform that records everything the bot does
#[derive(Default)]
pub struct MockPlatform {
    channels: Mutex<HashMap<String, String>>,
    members: Mutex<HashMap<(String, String), MemberInfo>>,
    sent: Mutex<Vec<(String, String)>>,
    renames: Mutex<Vec<(String, String)>>,
    fail_renames: AtomicBool,
    fail_member_lookups: AtomicBool,
    rename_delay: Mutex<Option<Duration>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_channel(&self, id: &str, name: &str) {
        self.channels
            .lock()
            .unwrap()
            .insert(id.to_string(), name.to_string());
    }

    pub fn add_member(&self, guild_id: &str, user_id: &str, member: MemberInfo) {
        self.members
            .lock()
            .unwrap()
            .insert((guild_id.to_string(), user_id.to_string()), member);
    }

    /// Current name of a channel on the "server"
    pub fn channel(&self, id: &str) -> Option<String> {
        self.channels.lock().unwrap().get(id).cloned()
    }

    /// Every (channel, text) sent so far
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Every successful (channel, new name) rename so far
    pub fn renames(&self) -> Vec<(String, String)> {
        self.renames.lock().unwrap().clone()
    }

    pub fn set_fail_renames(&self, fail: bool) {
        self.fail_renames.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_member_lookups(&self, fail: bool) {
        self.fail_member_lookups.store(fail, Ordering::SeqCst);
    }

    /// Make every rename take this long, like one stuck behind Discord's rate limit
    pub fn set_rename_delay(&self, delay: Duration) {
        *self.rename_delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl ChatPlatform for MockPlatform {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn rename_channel(&self, channel_id: &str, name: &str) -> Result<()> {
        let delay = *self.rename_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_renames.load(Ordering::SeqCst) {
            return Err(anyhow!("Missing permissions"));
        }

        let mut channels = self.channels.lock().unwrap();
        let Some(current) = channels.get_mut(channel_id) else {
            return Err(anyhow!("Unknown channel {}", channel_id));
        };
        *current = name.to_string();

        self.renames
            .lock()
            .unwrap()
            .push((channel_id.to_string(), name.to_string()));
        Ok(())
    }

    async fn channel_name(&self, channel_id: &str) -> Result<String> {
        self.channel(channel_id)
            .ok_or_else(|| anyhow!("Unknown channel {}", channel_id))
    }

    async fn lookup_member(&self, guild_id: &str, user_id: &str) -> Result<Option<MemberInfo>> {
        if self.fail_member_lookups.load(Ordering::SeqCst) {
            return Err(anyhow!("Discord API unavailable"));
        }

        Ok(self
            .members
            .lock()
            .unwrap()
            .get(&(guild_id.to_string(), user_id.to_string()))
            .cloned())
    }
}

/// A fixed join date used by the member fixtures
pub fn test_join_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 3, 14, 15, 9, 26).unwrap()
}

pub fn create_test_member(name: &str) -> MemberInfo {
    MemberInfo {
        display_name: name.to_string(),
        joined_at: Some(test_join_date()),
    }
}

/// Create a message sent in server "g1" without a cached member record
pub fn create_test_message(author_id: &str, channel_id: &str, content: &str) -> IncomingMessage {
    IncomingMessage {
        author_id: author_id.to_string(),
        author_is_bot: false,
        channel_id: channel_id.to_string(),
        guild_id: Some("g1".to_string()),
        content: content.to_string(),
        member: None,
    }
}

/// Create a test config for unit tests
pub fn create_test_config() -> Config {
    Config::new(
        "test_token".to_string(),
        vec!["c1".to_string(), "c2".to_string()],
        5000,
    )
}

/// Let background tasks that are ready to run (like channel renames) finish
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
