//! Online client tracking.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use booklink_core::{is_expired, ChannelId, ClientId, Clock, SystemClock};

/// Configuration for presence tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Seconds after the last refresh before a client counts as offline.
    pub timeout_secs: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self { timeout_secs: 5 }
    }
}

struct Seen {
    last_seen: i64,
    /// Key of this client in `Presence::by_recency`.
    seq: u64,
    channel_id: ChannelId,
}

#[derive(Default)]
struct Presence {
    next_seq: u64,
    /// Refresh order, least recently seen first.
    by_recency: BTreeMap<u64, ClientId>,
    seen: HashMap<ClientId, Seen>,
    /// Never holds an empty set.
    by_channel: HashMap<ChannelId, BTreeSet<ClientId>>,
}

impl Presence {
    fn leave_channel(&mut self, client_id: &ClientId, channel_id: &ChannelId) {
        if let Some(members) = self.by_channel.get_mut(channel_id) {
            members.remove(client_id);
            if members.is_empty() {
                self.by_channel.remove(channel_id);
            }
        }
    }

    fn refresh(&mut self, client_id: &ClientId, channel_id: &ChannelId, now: i64) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let previous = self.seen.insert(
            client_id.clone(),
            Seen {
                last_seen: now,
                seq,
                channel_id: channel_id.clone(),
            },
        );
        if let Some(previous) = previous {
            self.by_recency.remove(&previous.seq);
            if previous.channel_id != *channel_id {
                self.leave_channel(client_id, &previous.channel_id);
            }
        }

        self.by_recency.insert(seq, client_id.clone());
        self.by_channel
            .entry(channel_id.clone())
            .or_default()
            .insert(client_id.clone());
    }

    /// Drop clients from the stale end of the recency order.
    fn purge(&mut self, timeout_secs: u64, now: i64) -> usize {
        let mut removed = 0;
        while let Some(entry) = self.by_recency.first_entry() {
            let stale = self
                .seen
                .get(entry.get())
                .map_or(true, |seen| is_expired(seen.last_seen, timeout_secs, now));
            if !stale {
                break;
            }

            let client_id = entry.remove();
            if let Some(seen) = self.seen.remove(&client_id) {
                self.leave_channel(&client_id, &seen.channel_id);
            }
            removed += 1;
        }
        removed
    }
}

/// Records when clients were last seen and which channel they were using.
///
/// A client is online while its last refresh is no older than the timeout.
/// Clients are kept in refresh order, so purging stops at the first one
/// still online instead of scanning everything.
pub struct ClientsOnline {
    config: PresenceConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<Presence>,
}

impl ClientsOnline {
    pub fn new(config: PresenceConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            state: Mutex::new(Presence::default()),
        }
    }

    /// Track clients against wall-clock time.
    pub fn with_system_clock(config: PresenceConfig) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }

    /// Mark `client_id` as seen now, using `channel_id`.
    ///
    /// A client is a member of one channel at a time; refreshing with a
    /// different channel moves it.
    pub fn refresh_last_seen(&self, client_id: &ClientId, channel_id: &ChannelId) {
        let now = self.clock.now_millis();
        let mut state = self.state.lock();
        state.purge(self.config.timeout_secs, now);
        state.refresh(client_id, channel_id, now);
    }

    /// Every client currently online.
    pub fn all(&self) -> BTreeSet<ClientId> {
        let mut state = self.state.lock();
        state.purge(self.config.timeout_secs, self.clock.now_millis());
        state.seen.keys().cloned().collect()
    }

    /// Clients currently online in `channel_id`.
    pub fn all_for_channel(&self, channel_id: &ChannelId) -> BTreeSet<ClientId> {
        let mut state = self.state.lock();
        state.purge(self.config.timeout_secs, self.clock.now_millis());
        state
            .by_channel
            .get(channel_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Forget every client whose timeout has passed. Returns how many went.
    pub fn purge(&self) -> usize {
        let removed = self
            .state
            .lock()
            .purge(self.config.timeout_secs, self.clock.now_millis());
        if removed > 0 {
            debug!(removed, "clients went offline");
        }
        removed
    }

    /// Number of tracked clients, including any not yet purged.
    pub fn len(&self) -> usize {
        self.state.lock().seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ClientsOnline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientsOnline")
            .field("config", &self.config)
            .field("tracked", &self.len())
            .finish()
    }
}
