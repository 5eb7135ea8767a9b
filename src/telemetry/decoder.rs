//! Control-event decoder.

use chrono::{DateTime, Utc};

use super::change_summary::{SummaryStyle, summarize_changes};
use super::payload::ControlMessage;
use super::timestamp;
use crate::domain::{DeviceCategory, DeviceEvent, EventId, EventType, format_name};
use crate::error::DecodeError;

/// Description attached to every manually triggered event.
pub const MANUAL_DESCRIPTION: &str = "Actuator state was changed manually by an operator.";

/// Threshold text for manual events.
const MANUAL_THRESHOLD: &str = "Manual Control";

/// Threshold text when a policy event carries none.
const MISSING_THRESHOLD: &str = "N/A";

/// Decodes one broker message into a [`DeviceEvent`].
///
/// Returns `Ok(None)` for well-formed messages whose event type is missing
/// or not recognized; those are ignored, not reported.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidUtf8`] for binary payloads,
/// [`DecodeError::MalformedJson`] if the payload is not a valid control
/// message and [`DecodeError::MissingRoom`] if it has no room id.
pub fn decode(
    topic: &str,
    payload: &[u8],
    received_at: DateTime<Utc>,
) -> Result<Option<DeviceEvent>, DecodeError> {
    let text = std::str::from_utf8(payload).map_err(|source| DecodeError::InvalidUtf8 {
        topic: topic.to_string(),
        source,
    })?;
    let message: ControlMessage =
        serde_json::from_str(text).map_err(|source| DecodeError::MalformedJson {
            topic: topic.to_string(),
            source,
        })?;

    let Some(room_id) = message
        .metadata
        .room_id
        .as_deref()
        .filter(|room| !room.trim().is_empty())
    else {
        return Err(DecodeError::MissingRoom {
            topic: topic.to_string(),
        });
    };

    let Some(event_type) = message.event_type().and_then(EventType::parse) else {
        tracing::debug!(
            topic,
            event_type = message.event_type().unwrap_or("<none>"),
            "ignoring unrecognized control event"
        );
        return Ok(None);
    };

    let location_path = match message.metadata.rack_id.as_deref() {
        Some(rack) => format!("{} - {}", format_name(room_id), format_name(rack)),
        None => format_name(room_id),
    };

    let device_type_raw = message.device_type.clone().unwrap_or_default();
    let data = &message.event_data;

    let (threshold_display, description, style) = match event_type {
        EventType::PolicyApplied => (
            data.threshold
                .as_ref()
                .and_then(threshold_text)
                .unwrap_or_else(|| MISSING_THRESHOLD.to_string()),
            data.description.clone().unwrap_or_default(),
            SummaryStyle::Automatic,
        ),
        EventType::Manual => (
            MANUAL_THRESHOLD.to_string(),
            MANUAL_DESCRIPTION.to_string(),
            SummaryStyle::Manual,
        ),
    };

    let change_summary =
        summarize_changes(data.old_state.as_ref(), data.new_state.as_ref(), style);

    let title = format!(
        "{} Actuator {}",
        format_name(&device_type_raw),
        event_type.as_str()
    )
    .trim()
    .to_uppercase();

    Ok(Some(DeviceEvent {
        id: EventId::new(),
        location_path,
        object_name: format_name(message.metadata.object_id.as_deref().unwrap_or_default()),
        resource_name: format_name(message.metadata.resource_id.as_deref().unwrap_or_default()),
        event_type,
        title,
        description,
        change_summary,
        severity: event_type.severity(),
        threshold_display,
        timestamp: timestamp::resolve(message.timestamp.as_ref(), received_at),
        category: DeviceCategory::classify(&device_type_raw, event_type),
        device_type_raw,
    }))
}

fn threshold_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::Severity;

    const TOPIC: &str = "rooms/server_room/racks/rack-01/objects/crac_1/resources/fan_1/control";

    fn now() -> DateTime<Utc> {
        let Some(t) = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).single() else {
            panic!("valid date");
        };
        t
    }

    fn decode_ok(raw: &str) -> DeviceEvent {
        match decode(TOPIC, raw.as_bytes(), now()) {
            Ok(Some(event)) => event,
            other => panic!("expected an event, got {other:?}"),
        }
    }

    #[test]
    fn policy_event_is_critical_with_threshold() {
        let event = decode_ok(
            r#"{
                "metadata": {"room_id": "server_room", "rack_id": "rack-01",
                             "object_id": "crac_1", "resource_id": "fan_1"},
                "type": "cooling_fan",
                "event_type": "POLICY_APPLIED",
                "event_data": {
                    "description": "Inlet temperature above 27",
                    "threshold": 27,
                    "old_state": {"status": "ON", "speed": 50},
                    "new_state": {"status": "ON", "speed": 90}
                },
                "timestamp": 1714557600000
            }"#,
        );
        assert_eq!(event.severity, Severity::Critical);
        assert_eq!(event.event_type, EventType::PolicyApplied);
        assert_eq!(event.location_path, "Server Room - Rack 01");
        assert_eq!(event.object_name, "Crac 1");
        assert_eq!(event.resource_name, "Fan 1");
        assert_eq!(event.threshold_display, "27");
        assert_eq!(event.description, "Inlet temperature above 27");
        assert_eq!(event.title, "COOLING FAN ACTUATOR POLICY_APPLIED");
        assert_eq!(
            event.change_summary.as_deref(),
            Some("Speed changed from 50% to 90%")
        );
        assert_eq!(event.category, DeviceCategory::Cooling);
        assert_eq!(event.timestamp, now());
    }

    #[test]
    fn severity_ignores_numeric_contents() {
        let event = decode_ok(
            r#"{"metadata": {"room_id": "r"}, "event_type": "POLICY_APPLIED",
                "event_data": {"threshold": 0.01, "new_state": {"speed": 1}}}"#,
        );
        assert_eq!(event.severity, Severity::Critical);
    }

    #[test]
    fn manual_event_is_medium_with_fixed_texts() {
        let event = decode_ok(
            r#"{
                "metadata": {"room_id": "server_room", "object_id": "pump_a", "resource_id": "pump"},
                "type": "pump",
                "event_type": "MANUAL",
                "event_data": {
                    "description": "ignored",
                    "threshold": 99,
                    "old_state": {"status": "OFF"},
                    "new_state": {"status": "ON"}
                }
            }"#,
        );
        assert_eq!(event.severity, Severity::Medium);
        assert_eq!(event.threshold_display, "Manual Control");
        assert_eq!(event.description, MANUAL_DESCRIPTION);
        assert_eq!(event.location_path, "Server Room");
        assert_eq!(
            event.change_summary.as_deref(),
            Some("Status manually changed from OFF to ON")
        );
        assert_eq!(event.category, DeviceCategory::Pump);
    }

    #[test]
    fn missing_threshold_and_description_default() {
        let event = decode_ok(
            r#"{"metadata": {"room_id": "r"}, "type": "fan", "event_type": "POLICY_APPLIED"}"#,
        );
        assert_eq!(event.threshold_display, "N/A");
        assert_eq!(event.description, "");
        assert!(event.change_summary.is_none());
    }

    #[test]
    fn string_threshold_is_kept_verbatim() {
        let event = decode_ok(
            r#"{"metadata": {"room_id": "r"}, "event_type": "POLICY_APPLIED",
                "event_data": {"threshold": "> 28.5 C"}}"#,
        );
        assert_eq!(event.threshold_display, "> 28.5 C");
    }

    #[test]
    fn unknown_event_type_is_ignored() {
        let result = decode(
            TOPIC,
            br#"{"metadata": {"room_id": "r"}, "event_type": "UNKNOWN"}"#,
            now(),
        );
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn missing_event_type_is_ignored() {
        let result = decode(TOPIC, br#"{"metadata": {"room_id": "r"}}"#, now());
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn non_json_is_malformed() {
        let result = decode(TOPIC, b"not json at all", now());
        assert!(matches!(result, Err(DecodeError::MalformedJson { .. })));
    }

    #[test]
    fn binary_payload_is_rejected() {
        let result = decode(TOPIC, &[0xff, 0xfe, 0x7b], now());
        assert!(matches!(result, Err(DecodeError::InvalidUtf8 { .. })));
    }

    #[test]
    fn blank_room_counts_as_missing() {
        let result = decode(
            TOPIC,
            br#"{"metadata": {"room_id": "  "}, "event_type": "MANUAL"}"#,
            now(),
        );
        assert!(matches!(result, Err(DecodeError::MissingRoom { .. })));
    }

    #[test]
    fn non_scalar_timestamp_uses_received_time() {
        let received = now();
        let Ok(Some(event)) = decode(
            TOPIC,
            br#"{"metadata": {"room_id": "r"}, "event_type": "MANUAL", "timestamp": true}"#,
            received,
        ) else {
            panic!("expected an event");
        };
        assert_eq!(event.timestamp, received);

        let Ok(Some(event)) = decode(
            TOPIC,
            br#"{"metadata": {"room_id": "r"}, "event_type": "MANUAL", "timestamp": {"s": 1}}"#,
            received,
        ) else {
            panic!("expected an event");
        };
        assert_eq!(event.timestamp, received);
    }

    #[test]
    fn missing_room_is_an_error() {
        let result = decode(
            TOPIC,
            br#"{"metadata": {"rack_id": "rack-01"}, "event_type": "MANUAL"}"#,
            now(),
        );
        assert!(matches!(result, Err(DecodeError::MissingRoom { .. })));
    }

    #[test]
    fn missing_timestamp_uses_received_time() {
        let event = decode_ok(r#"{"metadata": {"room_id": "r"}, "event_type": "MANUAL"}"#);
        assert_eq!(event.timestamp, now());
    }

    #[test]
    fn each_decode_mints_a_new_id() {
        let raw = r#"{"metadata": {"room_id": "r"}, "event_type": "MANUAL"}"#;
        assert_ne!(decode_ok(raw).id, decode_ok(raw).id);
    }
}
