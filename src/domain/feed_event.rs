//! Events pushed to the presentation layer.
//!
//! Every change visible to the UI is published as a [`FeedEvent`] through
//! the [`super::EventBus`] and forwarded to subscribed WebSocket clients.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ConnectionState, DeviceEvent, Notification};

/// UI-facing feed channel a client can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedChannel {
    /// Alert list snapshots.
    Alerts,
    /// Broker connection status.
    Connection,
    /// Toast notifications.
    Notifications,
}

impl FeedChannel {
    /// Parses a channel name as sent by WebSocket clients.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "alerts" => Some(Self::Alerts),
            "connection" => Some(Self::Connection),
            "notifications" => Some(Self::Notifications),
            _ => None,
        }
    }
}

/// Feed update broadcast after a state change.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum FeedEvent {
    /// The alert list changed; carries the full new snapshot.
    AlertsUpdated {
        /// Snapshot, newest first. Readers must not mutate it.
        alerts: Vec<DeviceEvent>,
        /// Time of the update.
        timestamp: DateTime<Utc>,
    },

    /// The broker connection changed state.
    ConnectionChanged {
        /// New state.
        state: ConnectionState,
        /// Mirrors `state.is_connected()` for simple UI bindings.
        connected: bool,
        /// Time of the transition.
        timestamp: DateTime<Utc>,
    },

    /// A user-visible notification.
    Notification {
        /// The notification itself.
        #[serde(flatten)]
        notification: Notification,
    },
}

impl FeedEvent {
    /// Returns the channel this event belongs to.
    #[must_use]
    pub const fn channel(&self) -> FeedChannel {
        match self {
            Self::AlertsUpdated { .. } => FeedChannel::Alerts,
            Self::ConnectionChanged { .. } => FeedChannel::Connection,
            Self::Notification { .. } => FeedChannel::Notifications,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::AlertsUpdated { .. } => "alerts_updated",
            Self::ConnectionChanged { .. } => "connection_changed",
            Self::Notification { .. } => "notification",
        }
    }

    /// Builds a [`FeedEvent::ConnectionChanged`] stamped now.
    #[must_use]
    pub fn connection(state: ConnectionState) -> Self {
        Self::ConnectionChanged {
            state,
            connected: state.is_connected(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn channel_names_parse() {
        assert_eq!(FeedChannel::parse("alerts"), Some(FeedChannel::Alerts));
        assert_eq!(FeedChannel::parse("connection"), Some(FeedChannel::Connection));
        assert_eq!(
            FeedChannel::parse("notifications"),
            Some(FeedChannel::Notifications)
        );
        assert_eq!(FeedChannel::parse("*"), None);
    }

    #[test]
    fn connection_event_serializes_flag() {
        let event = FeedEvent::connection(ConnectionState::Connected);
        assert_eq!(event.channel(), FeedChannel::Connection);
        let Ok(json) = serde_json::to_value(&event) else {
            panic!("serialization failed");
        };
        assert_eq!(json.get("event_type").and_then(|v| v.as_str()), Some("connection_changed"));
        assert_eq!(json.get("state").and_then(|v| v.as_str()), Some("connected"));
        assert_eq!(json.get("connected").and_then(|v| v.as_bool()), Some(true));
    }

    #[test]
    fn notification_is_flattened() {
        let event = FeedEvent::Notification {
            notification: Notification::error("boom"),
        };
        let Ok(json) = serde_json::to_value(&event) else {
            panic!("serialization failed");
        };
        assert_eq!(json.get("event_type").and_then(|v| v.as_str()), Some("notification"));
        assert_eq!(json.get("level").and_then(|v| v.as_str()), Some("error"));
        assert_eq!(json.get("message").and_then(|v| v.as_str()), Some("boom"));
    }
}
