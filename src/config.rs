//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

use crate::broker::{BrokerEndpoint, TopicFilterSet};
use crate::domain::alert_aggregator::{DEFAULT_CAPACITY, DEFAULT_DEDUPE_WINDOW_MS};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Broker address (`ws://host:port/path`, `wss://…`, `mqtt://…`).
    pub broker: BrokerEndpoint,

    /// MQTT client id.
    pub broker_client_id: String,

    /// MQTT keep-alive interval.
    pub broker_keep_alive: Duration,

    /// Fixed delay between reconnect attempts.
    pub reconnect_interval: Duration,

    /// Topic filters subscribed on every connect.
    pub topic_filters: TopicFilterSet,

    /// Base URL of the policy backend REST API.
    pub policy_api_url: String,

    /// Per-request timeout for policy backend calls.
    pub policy_api_timeout: Duration,

    /// Maximum number of retained alerts.
    pub alert_capacity: usize,

    /// Near-duplicate merge window in milliseconds.
    pub alert_dedupe_window_ms: i64,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Log output format.
    pub log_format: LogFormat,
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR`, `BROKER_URL` or `TOPIC_FILTERS`
    /// is set but invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .context("LISTEN_ADDR")?;

        let broker_url = std::env::var("BROKER_URL")
            .unwrap_or_else(|_| "ws://localhost:9001/mqtt".to_string());
        let broker = BrokerEndpoint::parse(&broker_url).context("BROKER_URL")?;

        let broker_client_id = std::env::var("BROKER_CLIENT_ID")
            .unwrap_or_else(|_| format!("hvac-gateway-{}", uuid::Uuid::new_v4().simple()));
        let broker_keep_alive = Duration::from_secs(parse_env("BROKER_KEEP_ALIVE_SECS", 30));
        let reconnect_interval =
            Duration::from_millis(parse_env("BROKER_RECONNECT_INTERVAL_MS", 1_000));

        let topic_filters = match std::env::var("TOPIC_FILTERS") {
            Ok(raw) => TopicFilterSet::new(raw.split(',')).context("TOPIC_FILTERS")?,
            Err(_) => TopicFilterSet::control_events(),
        };

        let policy_api_url = std::env::var("POLICY_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000/api".to_string());
        let policy_api_timeout = Duration::from_secs(parse_env("POLICY_API_TIMEOUT_SECS", 10));

        let alert_capacity = parse_env("ALERT_CAPACITY", DEFAULT_CAPACITY);
        let alert_dedupe_window_ms = parse_env("ALERT_DEDUPE_WINDOW_MS", DEFAULT_DEDUPE_WINDOW_MS);

        let event_bus_capacity = parse_env("EVENT_BUS_CAPACITY", 1_024);

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            broker,
            broker_client_id,
            broker_keep_alive,
            reconnect_interval,
            topic_filters,
            policy_api_url,
            policy_api_timeout,
            alert_capacity,
            alert_dedupe_window_ms,
            event_bus_capacity,
            log_format,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_falls_back_on_missing_key() {
        assert_eq!(parse_env("HVAC_GATEWAY_TEST_UNSET_KEY", 42_u64), 42);
    }
}
