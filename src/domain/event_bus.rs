//! Broadcast channel for feed events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. The alert feed,
//! the connection watcher and the policy service publish through it, and
//! every WebSocket connection subscribes once.

use tokio::sync::broadcast;

use super::{FeedEvent, Notification};

/// Broadcast bus for [`FeedEvent`]s.
///
/// When the ring buffer is full, the oldest events are dropped for lagging
/// receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<FeedEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    /// If there are no active receivers, the event is silently dropped.
    pub fn publish(&self, event: FeedEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Publishes a notification.
    pub fn notify(&self, notification: Notification) -> usize {
        self.publish(FeedEvent::Notification { notification })
    }

    /// Creates a new receiver that will receive all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::ConnectionState;

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish(FeedEvent::connection(ConnectionState::Connecting)), 0);
    }

    #[tokio::test]
    async fn subscriber_receives_notification() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        assert_eq!(bus.notify(Notification::error("decode failed")), 1);

        let Ok(FeedEvent::Notification { notification }) = rx.recv().await else {
            panic!("expected a notification");
        };
        assert_eq!(notification.message, "decode failed");
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let bus = EventBus::new(16);
        assert_eq!(bus.receiver_count(), 0);

        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);

        drop(rx1);
        assert_eq!(bus.receiver_count(), 1);
    }
}
