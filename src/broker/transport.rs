//! Transport seam between the connection manager and a concrete broker
//! client.

use async_trait::async_trait;

use crate::error::BrokerError;

/// One message as delivered by the broker, before any decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Topic the message was published on.
    pub topic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

impl InboundMessage {
    /// Creates a message from a topic and payload.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// A publish/subscribe client driven by [`super::ConnectionManager`].
///
/// Implementations hold at most one session. `connect` replaces any
/// previous session, so a transport can be reused across reconnects.
/// `next_message` must be cancel safe: the manager races it against
/// control commands.
#[async_trait]
pub trait BrokerTransport: Send + 'static {
    /// Opens a new session and waits until the broker accepts it.
    async fn connect(&mut self) -> Result<(), BrokerError>;

    /// Subscribes the current session to a filter.
    async fn subscribe(&mut self, filter: &str) -> Result<(), BrokerError>;

    /// Removes a filter from the current session.
    async fn unsubscribe(&mut self, filter: &str) -> Result<(), BrokerError>;

    /// Waits for the next published message. An error means the session
    /// is gone.
    async fn next_message(&mut self) -> Result<InboundMessage, BrokerError>;

    /// Closes the current session, if any.
    async fn close(&mut self);
}
