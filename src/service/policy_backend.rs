//! Client for the external policy backend.
//!
//! [`PolicyBackend`] is the seam; [`HttpPolicyBackend`] talks to the real
//! REST API with `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;

use crate::domain::{Policy, PolicyDraft, PolicyScope};
use crate::error::{GENERIC_BACKEND_MESSAGE, GatewayError};

/// CRUD operations on a scoped policy collection.
#[async_trait]
pub trait PolicyBackend: Send + Sync + std::fmt::Debug {
    /// Lists the policies of a scope.
    async fn list(&self, scope: &PolicyScope) -> Result<Vec<Policy>, GatewayError>;

    /// Creates a policy and returns it with its assigned id.
    async fn create(&self, scope: &PolicyScope, draft: &PolicyDraft)
    -> Result<Policy, GatewayError>;

    /// Replaces a policy.
    async fn update(
        &self,
        scope: &PolicyScope,
        policy_id: &str,
        draft: &PolicyDraft,
    ) -> Result<Policy, GatewayError>;

    /// Deletes a policy.
    async fn delete(&self, scope: &PolicyScope, policy_id: &str) -> Result<(), GatewayError>;
}

/// List responses come either as a bare array or wrapped.
#[derive(Deserialize)]
#[serde(untagged)]
enum PolicyList {
    Bare(Vec<Policy>),
    Wrapped { policies: Vec<Policy> },
}

/// REST implementation of [`PolicyBackend`].
#[derive(Debug, Clone)]
pub struct HttpPolicyBackend {
    client: Client,
    base_url: Url,
}

impl HttpPolicyBackend {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if `base_url` is not an absolute
    /// http(s) URL or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GatewayError::Internal(format!("policy api url {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::Internal(format!(
                "policy api url {base_url} cannot take a path"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Internal(format!("http client: {e}")))?;
        Ok(Self { client, base_url })
    }

    /// Appends path segments to the base URL, escaping each one.
    ///
    /// Empty, `.` and `..` segments are rejected: escaping cannot keep them
    /// from changing the path.
    fn url(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(GatewayError::InvalidRequest(format!(
                "invalid path identifier {bad:?}"
            )));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::Internal("policy api url cannot take a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl PolicyBackend for HttpPolicyBackend {
    async fn list(&self, scope: &PolicyScope) -> Result<Vec<Policy>, GatewayError> {
        let response = self
            .client
            .get(self.url(&scope.collection_segments())?)
            .send()
            .await
            .map_err(unavailable)?;
        let body = success_body(response).await?;
        match serde_json::from_slice::<PolicyList>(&body) {
            Ok(PolicyList::Bare(policies) | PolicyList::Wrapped { policies }) => Ok(policies),
            Err(e) => Err(GatewayError::BackendUnavailable(format!(
                "unexpected policy list: {e}"
            ))),
        }
    }

    async fn create(
        &self,
        scope: &PolicyScope,
        draft: &PolicyDraft,
    ) -> Result<Policy, GatewayError> {
        let response = self
            .client
            .post(self.url(&scope.collection_segments())?)
            .json(draft)
            .send()
            .await
            .map_err(unavailable)?;
        let body = success_body(response).await?;
        policy_from_body(scope, None, draft, &body)
    }

    async fn update(
        &self,
        scope: &PolicyScope,
        policy_id: &str,
        draft: &PolicyDraft,
    ) -> Result<Policy, GatewayError> {
        let response = self
            .client
            .put(self.url(&scope.item_segments(policy_id))?)
            .json(draft)
            .send()
            .await
            .map_err(unavailable)?;
        let body = success_body(response)
            .await
            .map_err(|e| missing_policy(e, policy_id))?;
        policy_from_body(scope, Some(policy_id), draft, &body)
    }

    async fn delete(&self, scope: &PolicyScope, policy_id: &str) -> Result<(), GatewayError> {
        let response = self
            .client
            .delete(self.url(&scope.item_segments(policy_id))?)
            .send()
            .await
            .map_err(unavailable)?;
        success_body(response)
            .await
            .map(|_| ())
            .map_err(|e| missing_policy(e, policy_id))
    }
}

fn unavailable(err: reqwest::Error) -> GatewayError {
    GatewayError::BackendUnavailable(err.to_string())
}

/// A 404 on an item path means the policy is gone.
fn missing_policy(err: GatewayError, policy_id: &str) -> GatewayError {
    match err {
        GatewayError::BackendApi { status: 404, .. } => {
            GatewayError::PolicyNotFound(policy_id.to_string())
        }
        other => other,
    }
}

/// Returns the body of a 2xx response, or a [`GatewayError::BackendApi`]
/// carrying the server's message.
async fn success_body(response: Response) -> Result<Vec<u8>, GatewayError> {
    let status = response.status();
    let body = response.bytes().await.map_err(unavailable)?;
    if status.is_success() {
        return Ok(body.to_vec());
    }
    let message = server_message(&body).unwrap_or_else(|| GENERIC_BACKEND_MESSAGE.to_string());
    tracing::warn!(status = status.as_u16(), %message, "policy backend rejected request");
    Err(GatewayError::BackendApi {
        status: status.as_u16(),
        message,
    })
}

/// Pulls a human message out of an error body: `message`, then `error`,
/// then `detail`.
fn server_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    ["message", "error", "detail"]
        .iter()
        .filter_map(|key| value.get(*key))
        .find_map(|v| match v {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Object(inner) => inner
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string),
            _ => None,
        })
}

/// Reads a policy from a create/update response. Backends that answer with
/// only an id (or nothing, for updates) get the policy rebuilt from the
/// draft.
fn policy_from_body(
    scope: &PolicyScope,
    known_id: Option<&str>,
    draft: &PolicyDraft,
    body: &[u8],
) -> Result<Policy, GatewayError> {
    if let Ok(policy) = serde_json::from_slice::<Policy>(body) {
        return Ok(policy);
    }
    let returned_id = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v.get("id") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        });
    match returned_id.or_else(|| known_id.map(str::to_string)) {
        Some(id) => Ok(scope.materialize(id, draft.clone())),
        None => Err(GatewayError::BackendUnavailable(
            "policy service returned no policy id".to_string(),
        )),
    }
}
