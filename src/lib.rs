//! # hvac-gateway
//!
//! Live telemetry and policy gateway for a simulated data-center HVAC
//! environment.
//!
//! The gateway holds one persistent connection to the telemetry broker,
//! turns actuator control messages into operator-facing alerts, keeps a
//! short de-duplicated list of the most recent ones, and relays threshold
//! policy CRUD to the external policy service. Browsers read everything
//! through a REST API and a WebSocket feed.
//!
//! ## Architecture
//!
//! ```text
//! Telemetry broker (MQTT over WebSocket)
//!     │
//!     ├── ConnectionManager (broker/)      reconnect loop, subscriptions
//!     ├── decoder (telemetry/)             raw message → DeviceEvent
//!     ├── AlertFeedService (service/)      AlertAggregator + EventBus
//!     │
//!     ├── PolicyService (service/)  ──►  policy REST backend
//!     │
//!     ├── REST Handlers (api/)
//!     └── WS Handler (ws/)
//!           │
//!         Browsers
//! ```

pub mod api;
pub mod app_state;
pub mod broker;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod telemetry;
pub mod ws;
