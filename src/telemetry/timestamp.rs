//! Event timestamp parsing.
//!
//! Publishers send either an epoch number or an ISO-8601 string. Anything
//! unparseable falls back to the ingestion time.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

/// Epoch values below this are taken as seconds, at or above as
/// milliseconds. 1e11 ms is March 1973; 1e11 s is year 5138.
const SECONDS_CUTOFF: f64 = 1e11;

/// Timestamp as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Unix epoch in seconds or milliseconds.
    Epoch(f64),
    /// ISO-8601 / RFC 3339 string.
    Text(String),
    /// Any other JSON value. Never resolves.
    Other(serde_json::Value),
}

impl RawTimestamp {
    /// Converts to UTC, returning `None` when the value cannot be parsed.
    #[must_use]
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Epoch(value) => from_epoch(*value),
            Self::Text(text) => from_text(text),
            Self::Other(_) => None,
        }
    }
}

/// Resolves an optional wire timestamp, defaulting to `received_at`.
#[must_use]
pub fn resolve(raw: Option<&RawTimestamp>, received_at: DateTime<Utc>) -> DateTime<Utc> {
    raw.and_then(RawTimestamp::to_utc).unwrap_or(received_at)
}

#[allow(clippy::cast_possible_truncation)]
fn from_epoch(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let millis = if value < SECONDS_CUTOFF {
        (value * 1_000.0).round() as i64
    } else {
        value.round() as i64
    };
    DateTime::from_timestamp_millis(millis)
}

fn from_text(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    // Naive ISO strings carry no offset; treat them as UTC.
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    trimmed.parse::<f64>().ok().and_then(from_epoch)
}
