//! Per-connection subscription manager.
//!
//! Tracks which feed channels a WebSocket client is subscribed to and
//! provides server-side event filtering.

use std::collections::HashSet;

use crate::domain::FeedChannel;

/// Manages the set of channel subscriptions for a single WebSocket
/// connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed channels. If `subscribe_all` is true, this set is ignored.
    channels: HashSet<FeedChannel>,
    /// Whether the client subscribes to all channels (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds channels to the subscription set.
    pub fn subscribe(&mut self, channels: &[FeedChannel], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.channels.extend(channels.iter().copied());
    }

    /// Removes channels from the subscription set. `wildcard` clears the
    /// `"*"` subscription as well.
    pub fn unsubscribe(&mut self, channels: &[FeedChannel], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for channel in channels {
            self.channels.remove(channel);
        }
    }

    /// Returns `true` if events of the channel should be forwarded.
    #[must_use]
    pub fn matches(&self, channel: FeedChannel) -> bool {
        self.subscribe_all || self.channels.contains(&channel)
    }

    /// Returns the number of explicitly subscribed channels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.channels.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
