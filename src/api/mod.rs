//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All resource endpoints are mounted under `/api/v1`.

pub mod dto;
pub mod handlers;

use axum::Router;
use axum::routing::get;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI document for the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "hvac-gateway", description = "Live HVAC telemetry and policy gateway"),
    paths(
        handlers::system::health_handler,
        handlers::alerts::list_alerts,
        handlers::alerts::connection_status,
        handlers::policies::list_policies,
        handlers::policies::create_policy,
        handlers::policies::update_policy,
        handlers::policies::delete_policy,
    ),
    tags(
        (name = "System", description = "Service status"),
        (name = "Alerts", description = "Live actuator events"),
        (name = "Policies", description = "Threshold automation rules"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the full application: REST, WebSocket and (with the
/// `swagger-ui` feature) interactive docs.
pub fn build_app(state: AppState) -> Router {
    let router = build_router().route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router.with_state(state)
}
