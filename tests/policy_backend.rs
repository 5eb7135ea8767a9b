//! `HttpPolicyBackend` against an in-process fake of the policy REST API.

#![allow(clippy::panic, clippy::expect_used, clippy::unwrap_used, missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Path;
use axum::http::{StatusCode, Uri};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{Value, json};

use hvac_gateway::domain::{
    ConditionOperator, PolicyAction, PolicyCondition, PolicyDraft, PolicyScope,
};
use hvac_gateway::error::{GENERIC_BACKEND_MESSAGE, GatewayError};
use hvac_gateway::service::{HttpPolicyBackend, PolicyBackend};

fn stored_policy(room: &str) -> Value {
    json!({
        "id": "p-1",
        "description": "cold aisle",
        "room_id": room,
        "sensor_id": "temp_1",
        "condition": {"operator": "<=", "value": 18},
        "action": {"resource_id": "heater_1", "actuator_type": "heater", "command": {"status": "ON"}}
    })
}

async fn start_fake() -> String {
    let app = Router::new()
        .route(
            "/api/rooms/{room}/policies",
            get(|Path(room): Path<String>| async move {
                Json(json!({ "policies": [stored_policy(&room)] }))
            })
            .post(|| async { (StatusCode::CREATED, Json(json!({"id": 42}))) }),
        )
        .route(
            "/api/rooms/{room}/policies/{id}",
            put(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"detail": "no such policy"})),
                )
            }),
        )
        .route(
            "/api/rooms/{room}/racks/{rack}/policies/{id}",
            put(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"detail": "threshold out of range"})),
                )
            })
            .delete(|| async { StatusCode::NO_CONTENT }),
        )
        .route(
            "/api/rooms/{room}/racks/{rack}/objects/{object}/policies",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>") }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });
    format!("http://{addr}/api/")
}

fn draft() -> PolicyDraft {
    PolicyDraft {
        description: "cold aisle".to_string(),
        sensor_id: "temp_1".to_string(),
        condition: PolicyCondition {
            operator: ConditionOperator::LessOrEqual,
            value: 18.0,
        },
        action: PolicyAction {
            resource_id: "heater_1".to_string(),
            actuator_type: "heater".to_string(),
            command: json!({"status": "ON"}),
        },
    }
}

fn backend(base_url: &str) -> HttpPolicyBackend {
    HttpPolicyBackend::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn lists_wrapped_policy_arrays() {
    let backend = backend(&start_fake().await);
    let policies = backend.list(&PolicyScope::room("lab")).await.unwrap();
    assert_eq!(policies.len(), 1);
    assert_eq!(policies.first().map(|p| p.room_id.as_str()), Some("lab"));
    assert_eq!(
        policies.first().map(|p| p.condition.operator),
        Some(ConditionOperator::LessOrEqual)
    );
}

#[tokio::test]
async fn create_rebuilds_policy_from_returned_id() {
    let backend = backend(&start_fake().await);
    let policy = backend
        .create(&PolicyScope::room("lab"), &draft())
        .await
        .unwrap();
    assert_eq!(policy.id, "42");
    assert_eq!(policy.sensor_id, "temp_1");
}

#[tokio::test]
async fn error_detail_is_passed_through() {
    let backend = backend(&start_fake().await);
    let scope = PolicyScope::room("lab").with_rack("r1");
    let result = backend.update(&scope, "p-1", &draft()).await;
    let Err(GatewayError::BackendApi { status, message }) = result else {
        panic!("expected a backend error, got {result:?}");
    };
    assert_eq!(status, 422);
    assert_eq!(message, "threshold out of range");
}

#[tokio::test]
async fn delete_accepts_no_content() {
    let backend = backend(&start_fake().await);
    let scope = PolicyScope::room("lab").with_rack("r1");
    tokio_test::assert_ok!(backend.delete(&scope, "p-1").await);
}

#[tokio::test]
async fn non_json_error_uses_generic_message() {
    let backend = backend(&start_fake().await);
    let scope = PolicyScope::room("lab").with_rack("r1").with_object("crac_1");
    let result = backend.list(&scope).await;
    let Err(GatewayError::BackendApi { status, message }) = result else {
        panic!("expected a backend error, got {result:?}");
    };
    assert_eq!(status, 500);
    assert_eq!(message, GENERIC_BACKEND_MESSAGE);
}

#[tokio::test]
async fn unknown_policy_is_not_found() {
    let backend = backend(&start_fake().await);
    let result = backend
        .update(&PolicyScope::room("lab"), "p-404", &draft())
        .await;
    let Err(GatewayError::PolicyNotFound(id)) = result else {
        panic!("expected a missing policy, got {result:?}");
    };
    assert_eq!(id, "p-404");
}

#[tokio::test]
async fn identifiers_cannot_escape_the_policy_path() {
    let seen = Arc::new(parking_lot::Mutex::new(Vec::<String>::new()));
    let recorder = Arc::clone(&seen);
    let app = Router::new().fallback(move |uri: Uri| {
        let recorder = Arc::clone(&recorder);
        async move {
            recorder.lock().push(uri.to_string());
            Json(json!([]))
        }
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });

    let backend = backend(&format!("http://{addr}/api"));
    backend
        .list(&PolicyScope::room("x/../../admin"))
        .await
        .unwrap();
    backend.list(&PolicyScope::room("r?drop=1#")).await.unwrap();

    assert_eq!(
        *seen.lock(),
        vec![
            "/api/rooms/x%2F..%2F..%2Fadmin/policies".to_string(),
            "/api/rooms/r%3Fdrop=1%23/policies".to_string(),
        ]
    );
}

#[tokio::test]
async fn unreachable_backend_is_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = backend(&format!("http://{addr}/api"));
    let result = backend.list(&PolicyScope::room("lab")).await;
    assert!(matches!(result, Err(GatewayError::BackendUnavailable(_))));
}
