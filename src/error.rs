//! Error types for the gateway.
//!
//! [`GatewayError`] is the error type for REST handlers and the policy
//! collaborator. Each variant maps to an HTTP status code and structured
//! JSON error response. [`DecodeError`] and [`BrokerError`] belong to the
//! telemetry pipeline and never reach an HTTP client: they are logged and,
//! for decode failures, surfaced as notifications.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Fallback text when the policy backend gives no usable message.
pub const GENERIC_BACKEND_MESSAGE: &str = "Request to policy service failed";

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "policy not found: p-17",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                |
/// |-----------|-----------------|----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request            |
/// | 2000–2999 | Not Found       | 404 Not Found              |
/// | 3000–3999 | Server          | 500 Internal Server Error  |
/// | 5000–5999 | Upstream        | 502 / 503                  |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The policy does not exist in the requested scope.
    #[error("policy not found: {0}")]
    PolicyNotFound(String),

    /// The policy backend answered with an error status.
    #[error("{message}")]
    BackendApi {
        /// HTTP status returned by the backend.
        status: u16,
        /// Server-provided message or [`GENERIC_BACKEND_MESSAGE`].
        message: String,
    },

    /// The policy backend could not be reached or returned garbage.
    #[error("policy service unavailable: {0}")]
    BackendUnavailable(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::PolicyNotFound(_) => 2001,
            Self::Internal(_) => 3000,
            Self::BackendApi { .. } => 5001,
            Self::BackendUnavailable(_) => 5002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::PolicyNotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendApi { status, .. } => match StatusCode::from_u16(*status) {
                Ok(code) if code.is_client_error() => code,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

/// Why a broker message could not be turned into an event.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The payload is not UTF-8 text.
    #[error("telemetry payload on {topic} is not UTF-8: {source}")]
    InvalidUtf8 {
        /// Topic the message arrived on.
        topic: String,
        /// Underlying conversion error.
        #[source]
        source: std::str::Utf8Error,
    },

    /// The payload is not valid JSON or does not match the message shape.
    #[error("malformed telemetry payload on {topic}: {source}")]
    MalformedJson {
        /// Topic the message arrived on.
        topic: String,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },

    /// The message metadata carries no room identifier.
    #[error("telemetry payload on {topic} has no room_id")]
    MissingRoom {
        /// Topic the message arrived on.
        topic: String,
    },
}

/// Broker transport failures. All of them feed the reconnect loop.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BrokerError {
    /// The connection attempt failed.
    #[error("connect failed: {0}")]
    Connect(String),

    /// A subscribe or unsubscribe request was rejected or could not be sent.
    #[error("subscription failed for {filter}: {reason}")]
    Subscribe {
        /// Topic filter concerned.
        filter: String,
        /// Transport-provided reason.
        reason: String,
    },

    /// A topic filter is not valid MQTT filter syntax.
    #[error("invalid topic filter {filter:?}: {reason}")]
    InvalidFilter {
        /// Offending filter.
        filter: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// An established connection dropped.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The connection manager has been shut down.
    #[error("connection manager closed")]
    Closed,
}
