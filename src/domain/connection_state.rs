//! Broker connection states.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Explicit state of the broker connection.
///
/// `Connecting` covers both the first attempt and every retry, so
/// "connected" means exactly [`ConnectionState::Connected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No live connection and no attempt in flight.
    #[default]
    Disconnected,
    /// A connection attempt is in progress.
    Connecting,
    /// Connected and subscribed.
    Connected,
}

impl ConnectionState {
    /// Returns `true` only for [`ConnectionState::Connected`].
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns the state as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
