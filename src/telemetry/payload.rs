//! Wire types for control-event messages published by the backend.

use serde::Deserialize;

use super::timestamp::RawTimestamp;

/// Top-level control-event message body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControlMessage {
    /// Location and identity of the emitting actuator.
    #[serde(default)]
    pub metadata: MessageMetadata,
    /// Device/actuator type string (e.g. `cooling_unit`).
    #[serde(default, rename = "type")]
    pub device_type: Option<String>,
    /// Event type discriminator (`POLICY_APPLIED`, `MANUAL`, ...).
    #[serde(default)]
    pub event_type: Option<String>,
    /// Event details.
    #[serde(default)]
    pub event_data: EventData,
    /// Event time as epoch number or ISO-8601 string.
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
}

impl ControlMessage {
    /// Event type from the top level, falling back to `event_data`.
    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        self.event_type
            .as_deref()
            .or(self.event_data.event_type.as_deref())
    }
}

/// Identifiers locating the actuator in the facility.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageMetadata {
    /// Room identifier. Required for a message to be displayable.
    #[serde(default)]
    pub room_id: Option<String>,
    /// Rack identifier, absent for room-level devices.
    #[serde(default)]
    pub rack_id: Option<String>,
    /// Smart-object identifier.
    #[serde(default)]
    pub object_id: Option<String>,
    /// Resource (actuator) identifier within the object.
    #[serde(default)]
    pub resource_id: Option<String>,
}

/// Event-specific payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventData {
    /// Nested event type, used when the top level omits it.
    #[serde(default)]
    pub event_type: Option<String>,
    /// Free text describing what happened.
    #[serde(default)]
    pub description: Option<String>,
    /// Policy threshold (number or string).
    #[serde(default)]
    pub threshold: Option<serde_json::Value>,
    /// Actuator state before the change.
    #[serde(default)]
    pub old_state: Option<ActuatorState>,
    /// Actuator state after the change.
    #[serde(default)]
    pub new_state: Option<ActuatorState>,
}

/// Subset of actuator state compared for change summaries.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActuatorState {
    /// On/off style status.
    #[serde(default)]
    pub status: Option<String>,
    /// Speed in percent.
    #[serde(default)]
    pub speed: Option<f64>,
    /// Discrete level.
    #[serde(default)]
    pub level: Option<f64>,
    /// Requested speed in percent.
    #[serde(default)]
    pub target_speed: Option<f64>,
}
