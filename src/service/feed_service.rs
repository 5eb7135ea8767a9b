//! Alert feed service: decoder → aggregator → event bus.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::broker::InboundMessage;
use crate::domain::{
    AlertAggregator, DeviceEvent, EventBus, FeedEvent, IngestOutcome, Notification,
};
use crate::telemetry;

/// Single-writer owner of the live alert list.
///
/// Only the broker connection task writes, through
/// [`AlertFeedService::handle_message`]. Readers get owned snapshots and
/// are told about changes through [`FeedEvent::AlertsUpdated`].
#[derive(Debug)]
pub struct AlertFeedService {
    store: RwLock<AlertAggregator>,
    event_bus: EventBus,
}

impl AlertFeedService {
    /// Creates a service around an (usually empty) aggregator.
    #[must_use]
    pub fn new(aggregator: AlertAggregator, event_bus: EventBus) -> Self {
        Self {
            store: RwLock::new(aggregator),
            event_bus,
        }
    }

    /// Decodes and ingests one broker message, stamped with the current
    /// time.
    pub fn handle_message(&self, message: &InboundMessage) -> Option<IngestOutcome> {
        self.handle_message_at(message, Utc::now())
    }

    /// Decodes and ingests one broker message.
    ///
    /// Malformed messages are logged, reported as one error notification
    /// and dropped. Unrecognized event types are dropped silently.
    /// Returns what the aggregator did, or `None` if nothing was ingested.
    pub fn handle_message_at(
        &self,
        message: &InboundMessage,
        received_at: DateTime<Utc>,
    ) -> Option<IngestOutcome> {
        match telemetry::decode(&message.topic, &message.payload, received_at) {
            Ok(Some(event)) => Some(self.ingest(event)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(topic = %message.topic, error = %e, "dropping telemetry message");
                self.event_bus
                    .notify(Notification::error(format!("Could not read telemetry: {e}")));
                None
            }
        }
    }

    /// Ingests an already decoded event and publishes the new snapshot.
    pub fn ingest(&self, event: DeviceEvent) -> IngestOutcome {
        let (outcome, alerts) = {
            let mut store = self.store.write();
            let outcome = store.ingest(event);
            (outcome, store.snapshot())
        };

        match outcome {
            IngestOutcome::Inserted { evicted } => {
                tracing::debug!(evicted, size = alerts.len(), "alert inserted");
            }
            IngestOutcome::Merged { position } => {
                tracing::debug!(position, "alert merged into existing entry");
            }
        }

        self.event_bus.publish(FeedEvent::AlertsUpdated {
            alerts,
            timestamp: Utc::now(),
        });
        outcome
    }

    /// Returns the current alerts, newest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DeviceEvent> {
        self.store.read().snapshot()
    }

    /// Returns the number of retained alerts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    /// Returns the maximum number of retained alerts.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.store.read().capacity()
    }

    /// Returns `true` before the first alert arrives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::TimeDelta;
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::domain::{FeedChannel, Severity};

    const TOPIC: &str = "rooms/server_room/objects/crac_1/resources/fan_1/control";

    fn service() -> AlertFeedService {
        AlertFeedService::new(AlertAggregator::new(), EventBus::new(64))
    }

    fn policy_message(object: &str, timestamp_ms: i64) -> InboundMessage {
        let body = format!(
            r#"{{"metadata": {{"room_id": "server_room", "object_id": "{object}", "resource_id": "fan_1"}},
                "type": "fan", "event_type": "POLICY_APPLIED",
                "event_data": {{"threshold": 30}}, "timestamp": {timestamp_ms}}}"#
        );
        InboundMessage::new(TOPIC, body)
    }

    #[test]
    fn decoded_event_is_stored_and_published() {
        let svc = service();
        let mut rx = svc.event_bus().subscribe();

        let outcome = svc.handle_message(&policy_message("crac_1", 1_714_557_600_000));
        assert_eq!(outcome, Some(IngestOutcome::Inserted { evicted: 0 }));
        assert_eq!(svc.len(), 1);

        let Ok(FeedEvent::AlertsUpdated { alerts, .. }) = rx.try_recv() else {
            panic!("expected an alerts update");
        };
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts.first().map(|a| a.severity), Some(Severity::Critical));
    }

    #[test]
    fn malformed_payload_notifies_once_and_leaves_store_alone() {
        let svc = service();
        svc.handle_message(&policy_message("crac_1", 1_714_557_600_000));
        let before = svc.snapshot();
        let mut rx = svc.event_bus().subscribe();

        let outcome = svc.handle_message(&InboundMessage::new(TOPIC, "{not json"));
        assert_eq!(outcome, None);

        let Ok(event) = rx.try_recv() else {
            panic!("expected a notification");
        };
        assert_eq!(event.channel(), FeedChannel::Notifications);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(svc.snapshot(), before);
    }

    #[test]
    fn unknown_event_type_adds_nothing_and_stays_quiet() {
        let svc = service();
        let mut rx = svc.event_bus().subscribe();
        let message = InboundMessage::new(
            TOPIC,
            r#"{"metadata": {"room_id": "server_room"}, "event_type": "UNKNOWN"}"#,
        );

        assert_eq!(svc.handle_message(&message), None);
        assert!(svc.is_empty());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn near_duplicate_messages_merge() {
        let svc = service();
        let first = svc.handle_message(&policy_message("crac_1", 1_714_557_600_000));
        let second = svc.handle_message(&policy_message("crac_1", 1_714_557_602_000));

        assert_eq!(first, Some(IngestOutcome::Inserted { evicted: 0 }));
        assert_eq!(second, Some(IngestOutcome::Merged { position: 0 }));
        assert_eq!(svc.len(), 1);
    }

    #[test]
    fn missing_timestamp_uses_receive_time() {
        let svc = service();
        let received = Utc::now() - TimeDelta::minutes(5);
        let message = InboundMessage::new(
            TOPIC,
            r#"{"metadata": {"room_id": "server_room"}, "event_type": "MANUAL"}"#,
        );
        svc.handle_message_at(&message, received);
        let snapshot = svc.snapshot();
        assert_eq!(snapshot.first().map(|e| e.timestamp), Some(received));
    }
}
