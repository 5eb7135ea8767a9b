//! Alert feed and broker status handlers.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{AlertListResponse, ConnectionStatusResponse};
use crate::app_state::AppState;

/// `GET /alerts` — Current alert list.
#[utoipa::path(
    get,
    path = "/api/v1/alerts",
    tag = "Alerts",
    summary = "List live alerts",
    description = "Returns the retained actuator events, newest first. Near-duplicates are already merged.",
    responses(
        (status = 200, description = "Alert snapshot", body = AlertListResponse),
    )
)]
pub async fn list_alerts(State(state): State<AppState>) -> Json<AlertListResponse> {
    let data = state.feed.snapshot();
    Json(AlertListResponse {
        count: data.len(),
        capacity: state.feed.capacity(),
        data,
    })
}

/// `GET /connection` — Broker connection state.
#[utoipa::path(
    get,
    path = "/api/v1/connection",
    tag = "Alerts",
    summary = "Broker connection state",
    description = "Reports whether the gateway is currently connected to the telemetry broker.",
    responses(
        (status = 200, description = "Connection state", body = ConnectionStatusResponse),
    )
)]
pub async fn connection_status(State(state): State<AppState>) -> Json<ConnectionStatusResponse> {
    Json(state.connection_state().into())
}

/// Alert routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/alerts", get(list_alerts))
        .route("/connection", get(connection_status))
}
