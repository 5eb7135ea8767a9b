//! Broker layer: one persistent publish/subscribe connection.
//!
//! [`ConnectionManager`] keeps the connection alive with a fixed-interval
//! retry loop and re-subscribes the configured [`TopicFilterSet`] on every
//! connect. [`MqttTransport`] is the production transport; anything that
//! implements [`BrokerTransport`] can stand in for it.

pub mod connection;
pub mod mqtt;
pub mod topics;
pub mod transport;

pub use connection::{
    ConnectionHandle, ConnectionManager, DEFAULT_RECONNECT_INTERVAL, MessageHandler,
};
pub use mqtt::{BrokerEndpoint, BrokerScheme, MqttTransport};
pub use topics::{SubscriptionPlan, SubscriptionTracker, TopicFilterSet};
pub use transport::{BrokerTransport, InboundMessage};
