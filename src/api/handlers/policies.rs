//! Policy CRUD handlers: list, create, update, delete.
//!
//! The same handlers serve three scopes: room, rack, and smart object.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::dto::{PolicyListResponse, PolicyPath};
use crate::app_state::AppState;
use crate::domain::{Policy, PolicyDraft};
use crate::error::{ErrorResponse, GatewayError};

/// `GET …/policies` — List policies of a scope.
///
/// # Errors
///
/// Returns [`GatewayError`] if the policy backend fails.
#[utoipa::path(
    get,
    path = "/api/v1/rooms/{room}/policies",
    tag = "Policies",
    summary = "List policies",
    description = "Lists the policies of a room. The same operation exists under `/rooms/{room}/racks/{rack}` and `/rooms/{room}/racks/{rack}/objects/{object}`.",
    params(("room" = String, Path, description = "Room identifier")),
    responses(
        (status = 200, description = "Policies of the scope", body = PolicyListResponse),
        (status = 502, description = "Policy backend failed", body = ErrorResponse),
    )
)]
pub async fn list_policies(
    State(state): State<AppState>,
    Path(path): Path<PolicyPath>,
) -> Result<Json<PolicyListResponse>, GatewayError> {
    let data = state.policies.list(&path.scope()).await?;
    Ok(Json(PolicyListResponse {
        count: data.len(),
        data,
    }))
}

/// `POST …/policies` — Create a policy.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for an incomplete body, or the
/// backend's error.
#[utoipa::path(
    post,
    path = "/api/v1/rooms/{room}/policies",
    tag = "Policies",
    summary = "Create a policy",
    description = "Creates a policy in a room. Rack and object scoped forms are also mounted.",
    params(("room" = String, Path, description = "Room identifier")),
    request_body = PolicyDraft,
    responses(
        (status = 201, description = "Policy created", body = Policy),
        (status = 400, description = "Invalid policy", body = ErrorResponse),
        (status = 502, description = "Policy backend failed", body = ErrorResponse),
    )
)]
pub async fn create_policy(
    State(state): State<AppState>,
    Path(path): Path<PolicyPath>,
    Json(draft): Json<PolicyDraft>,
) -> Result<impl IntoResponse, GatewayError> {
    let policy = state.policies.create(&path.scope(), &draft).await?;
    Ok((StatusCode::CREATED, Json(policy)))
}

/// `PUT …/policies/{id}` — Replace a policy.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for an incomplete body, or the
/// backend's error.
#[utoipa::path(
    put,
    path = "/api/v1/rooms/{room}/policies/{id}",
    tag = "Policies",
    summary = "Update a policy",
    description = "Replaces a policy in a room. Rack and object scoped forms are also mounted.",
    params(
        ("room" = String, Path, description = "Room identifier"),
        ("id" = String, Path, description = "Policy identifier"),
    ),
    request_body = PolicyDraft,
    responses(
        (status = 200, description = "Policy updated", body = Policy),
        (status = 400, description = "Invalid policy", body = ErrorResponse),
        (status = 404, description = "Policy not found", body = ErrorResponse),
    )
)]
pub async fn update_policy(
    State(state): State<AppState>,
    Path(path): Path<PolicyPath>,
    Json(draft): Json<PolicyDraft>,
) -> Result<Json<Policy>, GatewayError> {
    let id = policy_id(&path)?;
    let policy = state.policies.update(&path.scope(), id, &draft).await?;
    Ok(Json(policy))
}

/// `DELETE …/policies/{id}` — Delete a policy.
///
/// # Errors
///
/// Returns the backend's error.
#[utoipa::path(
    delete,
    path = "/api/v1/rooms/{room}/policies/{id}",
    tag = "Policies",
    summary = "Delete a policy",
    description = "Deletes a policy from a room. Rack and object scoped forms are also mounted.",
    params(
        ("room" = String, Path, description = "Room identifier"),
        ("id" = String, Path, description = "Policy identifier"),
    ),
    responses(
        (status = 204, description = "Policy deleted"),
        (status = 404, description = "Policy not found", body = ErrorResponse),
    )
)]
pub async fn delete_policy(
    State(state): State<AppState>,
    Path(path): Path<PolicyPath>,
) -> Result<StatusCode, GatewayError> {
    let id = policy_id(&path)?;
    state.policies.delete(&path.scope(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn policy_id(path: &PolicyPath) -> Result<&str, GatewayError> {
    path.id
        .as_deref()
        .ok_or_else(|| GatewayError::InvalidRequest("missing policy id".to_string()))
}

/// Policy routes for all three scopes.
pub fn routes() -> Router<AppState> {
    let scopes = [
        "/rooms/{room}",
        "/rooms/{room}/racks/{rack}",
        "/rooms/{room}/racks/{rack}/objects/{object}",
    ];
    scopes.iter().fold(Router::new(), |router, scope| {
        router
            .route(
                &format!("{scope}/policies"),
                get(list_policies).post(create_policy),
            )
            .route(
                &format!("{scope}/policies/{{id}}"),
                put(update_policy).delete(delete_policy),
            )
    })
}
