//! Telemetry decoding: broker payload → [`crate::domain::DeviceEvent`].
//!
//! The decoder is a pure, synchronous function. It never talks to the
//! broker or the alert store, which keeps it testable without a runtime.

pub mod change_summary;
pub mod decoder;
pub mod payload;
pub mod timestamp;

pub use change_summary::{SummaryStyle, summarize_changes};
pub use decoder::{MANUAL_DESCRIPTION, decode};
pub use payload::{ActuatorState, ControlMessage, EventData, MessageMetadata};
