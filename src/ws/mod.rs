//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams alert snapshots, broker
//! connection changes and notifications to the presentation layer.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
