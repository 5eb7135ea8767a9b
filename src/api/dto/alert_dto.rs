//! Alert feed and connection status DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ConnectionState, DeviceEvent};

/// Response body for `GET /alerts`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AlertListResponse {
    /// Retained alerts, newest first.
    pub data: Vec<DeviceEvent>,
    /// Number of alerts returned.
    pub count: usize,
    /// Maximum number of alerts the feed retains.
    pub capacity: usize,
}

/// Response body for `GET /connection`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConnectionStatusResponse {
    /// Current broker connection state.
    pub state: ConnectionState,
    /// `true` only while connected.
    pub connected: bool,
}

impl From<ConnectionState> for ConnectionStatusResponse {
    fn from(state: ConnectionState) -> Self {
        Self {
            state,
            connected: state.is_connected(),
        }
    }
}
