//! Domain layer: device events, the bounded alert store, and the event
//! system.
//!
//! This module contains the normalized event model produced by the
//! telemetry decoder, the [`AlertAggregator`] that retains recent events,
//! the [`EventBus`] for broadcasting feed updates, and the policy types
//! relayed to the backend.

pub mod alert_aggregator;
pub mod connection_state;
pub mod device_event;
pub mod event_bus;
pub mod event_id;
pub mod feed_event;
pub mod naming;
pub mod notification;
pub mod policy;

pub use alert_aggregator::{AlertAggregator, IngestOutcome};
pub use connection_state::ConnectionState;
pub use device_event::{DeviceCategory, DeviceEvent, EventType, Severity};
pub use event_bus::EventBus;
pub use event_id::EventId;
pub use feed_event::{FeedChannel, FeedEvent};
pub use naming::format_name;
pub use notification::{Notification, NotificationLevel};
pub use policy::{
    ConditionOperator, Policy, PolicyAction, PolicyCondition, PolicyDraft, PolicyScope,
};
