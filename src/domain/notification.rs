//! User-visible transient notifications.
//!
//! Pipeline and backend failures never propagate to callers. They are
//! logged and turned into a [`Notification`] that the presentation layer
//! shows as a toast.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Notification urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    /// Confirmation of a successful action.
    Info,
    /// Something degraded but still working.
    Warning,
    /// An operation failed.
    Error,
}

/// A single toast message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    /// Urgency.
    pub level: NotificationLevel,
    /// Human-readable text.
    pub message: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Creates an info notification stamped now.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    /// Creates an error notification stamped now.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}
