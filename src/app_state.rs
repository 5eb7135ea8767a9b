//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::{ConnectionState, EventBus};
use crate::service::{AlertFeedService, PolicyService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Live alert list.
    pub feed: Arc<AlertFeedService>,
    /// Policy relay to the backend.
    pub policies: PolicyService,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Broker connection state as observed by the UI.
    pub connection: watch::Receiver<ConnectionState>,
}

impl AppState {
    /// Current broker connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }
}
