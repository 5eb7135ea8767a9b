//! Normalized actuator events shown in the live alert feed.
//!
//! A [`DeviceEvent`] is built by the telemetry decoder from one broker
//! message and is afterwards only touched by the
//! [`super::AlertAggregator`] merge step.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::EventId;

/// Recognized control event types. Anything else is dropped by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// An automation policy fired and changed an actuator.
    PolicyApplied,
    /// An operator changed an actuator by hand.
    Manual,
}

impl EventType {
    /// Parses the wire representation (`POLICY_APPLIED`, `MANUAL`).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "POLICY_APPLIED" => Some(Self::PolicyApplied),
            "MANUAL" => Some(Self::Manual),
            _ => None,
        }
    }

    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PolicyApplied => "POLICY_APPLIED",
            Self::Manual => "MANUAL",
        }
    }

    /// Severity attached to every event of this type.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::PolicyApplied => Severity::Critical,
            Self::Manual => Severity::Medium,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse urgency used for ordering and coloring in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Needs immediate attention.
    Critical,
    /// Important but not urgent.
    High,
    /// Informational change worth noticing.
    Medium,
    /// Background noise.
    Low,
}

/// Display category derived once at decode time from the device type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCategory {
    /// Cooling units, chillers, CRAC/CRAH.
    Cooling,
    /// Fans and blowers.
    Fan,
    /// Coolant pumps.
    Pump,
    /// Temperature sensors and heaters.
    Temperature,
    /// Humidity sensors and humidifiers.
    Humidity,
    /// Power and energy meters.
    Energy,
    /// Unmatched device type on a manually triggered event.
    ManualControl,
    /// Anything else.
    Generic,
}

/// Ordered keyword rules. Actuator keywords come before sensor keywords so
/// that e.g. `fan_temperature_controller` resolves to [`DeviceCategory::Fan`].
const CATEGORY_RULES: &[(DeviceCategory, &[&str])] = &[
    (DeviceCategory::Cooling, &["cool", "chiller", "crac", "hvac"]),
    (DeviceCategory::Fan, &["fan", "blower"]),
    (DeviceCategory::Pump, &["pump"]),
    (DeviceCategory::Temperature, &["temp", "heat"]),
    (DeviceCategory::Humidity, &["humid"]),
    (DeviceCategory::Energy, &["energy", "power"]),
];

impl DeviceCategory {
    /// Picks a category by case-insensitive substring match on the raw
    /// device type. The event type breaks the tie when nothing matches.
    #[must_use]
    pub fn classify(device_type: &str, event_type: EventType) -> Self {
        let lowered = device_type.to_lowercase();
        CATEGORY_RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
            .map_or(
                match event_type {
                    EventType::Manual => Self::ManualControl,
                    EventType::PolicyApplied => Self::Generic,
                },
                |(category, _)| *category,
            )
    }
}

/// A decoded actuator event as retained by the alert feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeviceEvent {
    /// Unique within the feed; preserved across merges.
    pub id: EventId,
    /// `Room` or `Room - Rack`, human formatted.
    pub location_path: String,
    /// Formatted smart-object name.
    pub object_name: String,
    /// Formatted resource (actuator) name.
    pub resource_name: String,
    /// Recognized event type.
    pub event_type: EventType,
    /// Upper-cased `<DEVICE TYPE> ACTUATOR <EVENT TYPE>`.
    pub title: String,
    /// Free text from the payload or a fixed sentence for manual events.
    pub description: String,
    /// Field-by-field old/new state comparison, when anything changed.
    pub change_summary: Option<String>,
    /// Fixed per event type.
    pub severity: Severity,
    /// Policy threshold, `N/A`, or `Manual Control`.
    pub threshold_display: String,
    /// Event time, or ingestion time when the payload carried none.
    pub timestamp: DateTime<Utc>,
    /// Raw device type from the payload.
    pub device_type_raw: String,
    /// Icon/color category derived from `device_type_raw`.
    pub category: DeviceCategory,
}

impl DeviceEvent {
    /// Returns `true` if both events describe the same resource at the same
    /// location (the merge key, ignoring time).
    #[must_use]
    pub fn same_source(&self, other: &Self) -> bool {
        self.object_name == other.object_name
            && self.resource_name == other.resource_name
            && self.location_path == other.location_path
    }
}
