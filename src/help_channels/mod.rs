mod marker;

use anyhow::Result;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use marker::BusyMarker;

use crate::platform::{ChatPlatform, IncomingMessage};

/// Settings for the help channel tracker
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// How long a channel stays busy without new messages
    pub busy_timeout: Duration,
    /// The canonical suffix appended to busy channel names
    pub busy_suffix: String,
    /// Messages starting with this are ignored while a channel is free; this is the done
    /// command under the command prefix
    pub done_trigger: String,
}

/// Whether a message is the done command, read the way the command handler reads it
fn is_done_trigger(content: &str, done_trigger: &str) -> bool {
    content
        .trim_start()
        .to_lowercase()
        .starts_with(done_trigger)
}

/// State kept for one help channel
struct TrackedChannel {
    id: String,
    /// Last known name of the channel, including the marker while busy
    name: String,
    busy: bool,
    /// Who made the channel busy in the first place
    culprit: Option<String>,
    timer: Option<JoinHandle<()>>,
    /// Bumped every time a timer is armed; an expiry from an older timer is ignored
    generation: u64,
    /// Bumped for every rename requested; only the newest one is sent
    rename_seq: u64,
    /// Held while a rename of this channel is in flight
    rename_lock: Arc<Mutex<()>>,
}

impl TrackedChannel {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

struct TrackerInner {
    platform: Arc<dyn ChatPlatform>,
    marker: BusyMarker,
    busy_timeout: Duration,
    done_trigger: String,
    channels: Mutex<HashMap<String, TrackedChannel>>,
}

/// Renames help channels while they're busy
///
/// A tracked channel becomes busy on the first message sent to it and gets the busy
/// suffix added to its name. Every further message restarts the busy window. When the
/// window runs out, or the channel is explicitly marked as done, the suffix is removed
/// again.
///
/// Cloning the tracker is cheap; all clones share the same channel table.
#[derive(Clone)]
pub struct HelpChannelTracker {
    inner: Arc<TrackerInner>,
}

impl HelpChannelTracker {
    /// Create a new tracker with no channels
    ///
    /// # Arguments
    /// * `platform` - The chat platform used to look up and rename channels
    /// * `settings` - Timeout, busy suffix and done trigger
    ///
    /// # Returns
    /// An error if the busy suffix can't be turned into a marker
    pub fn new(platform: Arc<dyn ChatPlatform>, settings: TrackerSettings) -> Result<Self> {
        let marker = BusyMarker::new(&settings.busy_suffix)?;

        Ok(HelpChannelTracker {
            inner: Arc::new(TrackerInner {
                platform,
                marker,
                busy_timeout: settings.busy_timeout,
                done_trigger: settings.done_trigger.to_lowercase(),
                channels: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Look up and start tracking the given channels
    ///
    /// Channels whose name already carries the busy marker are recovered as busy and get a
    /// fresh timeout. Channels that can't be looked up are skipped.
    pub async fn start(&self, channel_ids: &[String]) {
        let platform = &self.inner.platform;
        let lookups = channel_ids.iter().map(|id| async move {
            let name = platform.channel_name(id).await;
            (id, name)
        });
        let results = join_all(lookups).await;

        let mut channels = self.inner.channels.lock().await;

        for (id, result) in results {
            let name = match result {
                Ok(name) => name,
                Err(e) => {
                    warn!("Could not look up help channel {}, not tracking it: {}", id, e);
                    continue;
                }
            };

            if channels.contains_key(id) {
                debug!("Help channel {} is configured twice", id);
                continue;
            }

            let busy = self.inner.marker.is_marked(&name);
            let mut channel = TrackedChannel {
                id: id.clone(),
                name,
                busy,
                culprit: None,
                timer: None,
                generation: 0,
                rename_seq: 0,
                rename_lock: Arc::new(Mutex::new(())),
            };

            if busy {
                info!("Help channel {} ({}) was left busy, restarting its timer", id, channel.name);
                self.arm_timer(&mut channel);
            }

            channels.insert(id.clone(), channel);
        }

        info!("Tracking {} help channels", channels.len());
    }

    /// Cancel every pending timer
    ///
    /// Busy channels keep their busy name, so they are recovered on the next start.
    pub async fn stop(&self) {
        let mut channels = self.inner.channels.lock().await;
        for channel in channels.values_mut() {
            channel.cancel_timer();
        }
    }

    /// Update the state of a help channel after a message was sent to it
    ///
    /// Messages in channels that aren't tracked are ignored. The rename runs in the
    /// background, so this never waits on Discord.
    pub async fn handle_message(&self, msg: &IncomingMessage) {
        let mut channels = self.inner.channels.lock().await;

        // If it's not a help channel, we don't need to be here
        let Some(channel) = channels.get_mut(&msg.channel_id) else {
            return;
        };

        if channel.busy {
            debug!("Help channel {} is still active", channel.id);
            self.arm_timer(channel);
        } else if is_done_trigger(&msg.content, &self.inner.done_trigger) {
            debug!("Ignoring done trigger in free help channel {}", channel.id);
        } else {
            channel.busy = true;
            channel.culprit = Some(msg.author_id.clone());
            channel.name = self.inner.marker.apply(&channel.name);
            self.arm_timer(channel);

            info!("Help channel {} is now busy (asked by {})", channel.id, msg.author_id);
            self.queue_rename(channel);
        }
    }

    /// Mark a help channel as free
    ///
    /// # Returns
    /// false if the channel isn't tracked
    pub async fn mark_not_busy(&self, channel_id: &str) -> bool {
        let mut channels = self.inner.channels.lock().await;
        let Some(channel) = channels.get_mut(channel_id) else {
            return false;
        };

        channel.cancel_timer();
        self.release(channel);

        info!("Help channel {} marked as free", channel_id);
        self.queue_rename(channel);
        true
    }

    /// Whether the channel is tracked and currently busy
    pub async fn is_busy(&self, channel_id: &str) -> bool {
        let channels = self.inner.channels.lock().await;
        channels.get(channel_id).is_some_and(|channel| channel.busy)
    }

    /// The user who made the channel busy, if known
    pub async fn culprit(&self, channel_id: &str) -> Option<String> {
        let channels = self.inner.channels.lock().await;
        channels
            .get(channel_id)
            .and_then(|channel| channel.culprit.clone())
    }

    /// Number of channels being tracked
    pub async fn tracked_count(&self) -> usize {
        self.inner.channels.lock().await.len()
    }

    /// Replace any pending timer of the channel with a fresh one
    fn arm_timer(&self, channel: &mut TrackedChannel) {
        channel.cancel_timer();
        channel.generation += 1;

        let generation = channel.generation;
        let id = channel.id.clone();
        let timeout = self.inner.busy_timeout;
        let tracker = self.clone();

        channel.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            tracker.expire(&id, generation).await;
        }));
    }

    /// Free a channel whose busy window ran out
    async fn expire(&self, channel_id: &str, generation: u64) {
        let mut channels = self.inner.channels.lock().await;
        let Some(channel) = channels.get_mut(channel_id) else {
            return;
        };

        if channel.generation != generation || !channel.busy {
            debug!("Stale timer for help channel {}", channel_id);
            return;
        }

        // This task is the timer, so detach instead of aborting it
        channel.timer = None;
        self.release(channel);

        info!("Help channel {} went quiet, marking as free", channel_id);
        self.queue_rename(channel);
    }

    /// Clear the busy state and drop the marker from the name
    fn release(&self, channel: &mut TrackedChannel) {
        channel.busy = false;
        channel.culprit = None;
        channel.name = self.inner.marker.strip(&channel.name).to_string();
    }

    /// Rename the channel to its current name in the background
    ///
    /// Discord heavily rate limits channel renames, so a rename can sit in serenity's
    /// ratelimiter for minutes. Renames of one channel are sent one at a time, and a rename
    /// that got superseded while it was waiting is dropped, so the last state always wins.
    fn queue_rename(&self, channel: &mut TrackedChannel) {
        channel.rename_seq += 1;

        let seq = channel.rename_seq;
        let id = channel.id.clone();
        let name = channel.name.clone();
        let rename_lock = channel.rename_lock.clone();
        let tracker = self.clone();

        tokio::spawn(async move {
            let _in_flight = rename_lock.lock().await;

            if !tracker.is_latest_rename(&id, seq).await {
                debug!("Skipping superseded rename of help channel {} to {}", id, name);
                return;
            }

            if let Err(e) = tracker.inner.platform.rename_channel(&id, &name).await {
                warn!("Failed to rename help channel {} to {}: {}", id, name, e);
            }
        });
    }

    async fn is_latest_rename(&self, channel_id: &str, seq: u64) -> bool {
        let channels = self.inner.channels.lock().await;
        channels
            .get(channel_id)
            .is_some_and(|channel| channel.rename_seq == seq)
    }
}

#[cfg(test)]
impl HelpChannelTracker {
    /// Whether the channel is tracked at all
    pub async fn is_tracked(&self, channel_id: &str) -> bool {
        self.inner.channels.lock().await.contains_key(channel_id)
    }

    /// The last known name of a tracked channel
    pub async fn channel_name(&self, channel_id: &str) -> Option<String> {
        let channels = self.inner.channels.lock().await;
        channels.get(channel_id).map(|channel| channel.name.clone())
    }

    /// Whether a busy timeout is pending for the channel
    pub async fn has_pending_timer(&self, channel_id: &str) -> bool {
        let channels = self.inner.channels.lock().await;
        channels
            .get(channel_id)
            .and_then(|channel| channel.timer.as_ref())
            .is_some_and(|timer| !timer.is_finished())
    }
}
