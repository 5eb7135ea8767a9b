//! Policy service: relays policy CRUD to the backend and keeps a per-scope
//! cache of the last known lists.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::policy_backend::PolicyBackend;
use crate::domain::{EventBus, Notification, Policy, PolicyDraft, PolicyScope};
use crate::error::{GENERIC_BACKEND_MESSAGE, GatewayError};

/// Orchestrates policy operations.
///
/// Every mutation follows the pattern: validate → call backend → on
/// success update the cache and notify. A failed call leaves the cache
/// untouched and publishes one error notification.
#[derive(Debug, Clone)]
pub struct PolicyService {
    backend: Arc<dyn PolicyBackend>,
    cache: Arc<RwLock<HashMap<PolicyScope, Vec<Policy>>>>,
    event_bus: EventBus,
}

impl PolicyService {
    /// Creates a new `PolicyService`.
    #[must_use]
    pub fn new(backend: Arc<dyn PolicyBackend>, event_bus: EventBus) -> Self {
        Self {
            backend,
            cache: Arc::new(RwLock::new(HashMap::new())),
            event_bus,
        }
    }

    /// Fetches the policies of a scope and refreshes the cache.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`GatewayError`] if the list cannot be fetched.
    pub async fn list(&self, scope: &PolicyScope) -> Result<Vec<Policy>, GatewayError> {
        let policies = self
            .backend
            .list(scope)
            .await
            .inspect_err(|e| self.report(e))?;
        self.cache.write().insert(scope.clone(), policies.clone());
        Ok(policies)
    }

    /// Returns the last successfully fetched list for a scope.
    #[must_use]
    pub fn cached(&self, scope: &PolicyScope) -> Vec<Policy> {
        self.cache.read().get(scope).cloned().unwrap_or_default()
    }

    /// Creates a policy.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for an incomplete draft, or
    /// the backend's error.
    pub async fn create(
        &self,
        scope: &PolicyScope,
        draft: &PolicyDraft,
    ) -> Result<Policy, GatewayError> {
        validate_draft(draft)?;
        let policy = self
            .backend
            .create(scope, draft)
            .await
            .inspect_err(|e| self.report(e))?;

        self.cache
            .write()
            .entry(scope.clone())
            .or_default()
            .push(policy.clone());
        tracing::info!(%scope, policy_id = %policy.id, "policy created");
        self.event_bus.notify(Notification::info("Policy created"));
        Ok(policy)
    }

    /// Replaces a policy.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for an incomplete draft, or
    /// the backend's error.
    pub async fn update(
        &self,
        scope: &PolicyScope,
        policy_id: &str,
        draft: &PolicyDraft,
    ) -> Result<Policy, GatewayError> {
        validate_draft(draft)?;
        let policy = self
            .backend
            .update(scope, policy_id, draft)
            .await
            .inspect_err(|e| self.report(e))?;

        {
            let mut cache = self.cache.write();
            let list = cache.entry(scope.clone()).or_default();
            match list.iter_mut().find(|p| p.id == policy_id) {
                Some(slot) => *slot = policy.clone(),
                None => list.push(policy.clone()),
            }
        }
        tracing::info!(%scope, policy_id, "policy updated");
        self.event_bus.notify(Notification::info("Policy updated"));
        Ok(policy)
    }

    /// Deletes a policy.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    pub async fn delete(&self, scope: &PolicyScope, policy_id: &str) -> Result<(), GatewayError> {
        self.backend
            .delete(scope, policy_id)
            .await
            .inspect_err(|e| self.report(e))?;

        if let Some(list) = self.cache.write().get_mut(scope) {
            list.retain(|p| p.id != policy_id);
        }
        tracing::info!(%scope, policy_id, "policy deleted");
        self.event_bus.notify(Notification::info("Policy deleted"));
        Ok(())
    }

    fn report(&self, err: &GatewayError) {
        tracing::warn!(error = %err, "policy request failed");
        self.event_bus
            .notify(Notification::error(user_message(err)));
    }
}

/// Text shown to the operator for a failed backend call.
#[must_use]
pub fn user_message(err: &GatewayError) -> String {
    match err {
        GatewayError::BackendApi { message, .. } => message.clone(),
        GatewayError::PolicyNotFound(_) | GatewayError::InvalidRequest(_) => err.to_string(),
        _ => GENERIC_BACKEND_MESSAGE.to_string(),
    }
}

fn validate_draft(draft: &PolicyDraft) -> Result<(), GatewayError> {
    if draft.sensor_id.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "sensor_id must not be empty".to_string(),
        ));
    }
    if draft.action.resource_id.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "action.resource_id must not be empty".to_string(),
        ));
    }
    if !draft.condition.value.is_finite() {
        return Err(GatewayError::InvalidRequest(
            "condition.value must be a finite number".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::domain::{
        ConditionOperator, FeedEvent, NotificationLevel, PolicyAction, PolicyCondition,
    };

    /// Backend that stores policies in memory, or fails every call.
    #[derive(Debug, Default)]
    struct MemoryBackend {
        policies: parking_lot::Mutex<Vec<Policy>>,
        fail_with: Option<(u16, String)>,
    }

    impl MemoryBackend {
        fn failing(status: u16, message: &str) -> Self {
            Self {
                fail_with: Some((status, message.to_string())),
                ..Self::default()
            }
        }

        fn check(&self) -> Result<(), GatewayError> {
            match &self.fail_with {
                Some((status, message)) => Err(GatewayError::BackendApi {
                    status: *status,
                    message: message.clone(),
                }),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl PolicyBackend for MemoryBackend {
        async fn list(&self, _scope: &PolicyScope) -> Result<Vec<Policy>, GatewayError> {
            self.check()?;
            Ok(self.policies.lock().clone())
        }

        async fn create(
            &self,
            scope: &PolicyScope,
            draft: &PolicyDraft,
        ) -> Result<Policy, GatewayError> {
            self.check()?;
            let mut policies = self.policies.lock();
            let policy = scope.materialize(format!("p-{}", policies.len() + 1), draft.clone());
            policies.push(policy.clone());
            Ok(policy)
        }

        async fn update(
            &self,
            scope: &PolicyScope,
            policy_id: &str,
            draft: &PolicyDraft,
        ) -> Result<Policy, GatewayError> {
            self.check()?;
            Ok(scope.materialize(policy_id.to_string(), draft.clone()))
        }

        async fn delete(&self, _scope: &PolicyScope, policy_id: &str) -> Result<(), GatewayError> {
            self.check()?;
            self.policies.lock().retain(|p| p.id != policy_id);
            Ok(())
        }
    }

    fn draft(sensor: &str) -> PolicyDraft {
        PolicyDraft {
            description: "hot aisle".to_string(),
            sensor_id: sensor.to_string(),
            condition: PolicyCondition {
                operator: ConditionOperator::GreaterThan,
                value: 28.0,
            },
            action: PolicyAction {
                resource_id: "fan_1".to_string(),
                actuator_type: "fan".to_string(),
                command: serde_json::json!({"status": "ON", "speed": 80}),
            },
        }
    }

    fn scope() -> PolicyScope {
        PolicyScope::room("server_room").with_rack("rack-01")
    }

    #[tokio::test]
    async fn create_updates_cache_and_notifies() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let svc = PolicyService::new(Arc::new(MemoryBackend::default()), bus);

        let Ok(policy) = svc.create(&scope(), &draft("temp_1")).await else {
            panic!("create should succeed");
        };
        assert_eq!(svc.cached(&scope()), vec![policy]);

        let Ok(FeedEvent::Notification { notification }) = rx.try_recv() else {
            panic!("expected a notification");
        };
        assert_eq!(notification.level, NotificationLevel::Info);
    }

    #[tokio::test]
    async fn update_replaces_cached_entry() {
        let svc = PolicyService::new(Arc::new(MemoryBackend::default()), EventBus::new(16));
        let Ok(created) = svc.create(&scope(), &draft("temp_1")).await else {
            panic!("create should succeed");
        };

        let Ok(updated) = svc.update(&scope(), &created.id, &draft("temp_2")).await else {
            panic!("update should succeed");
        };
        let cached = svc.cached(&scope());
        assert_eq!(cached.len(), 1);
        assert_eq!(cached.first().map(|p| p.sensor_id.as_str()), Some("temp_2"));
        assert_eq!(updated.id, created.id);
    }

    #[tokio::test]
    async fn delete_removes_cached_entry() {
        let svc = PolicyService::new(Arc::new(MemoryBackend::default()), EventBus::new(16));
        let Ok(created) = svc.create(&scope(), &draft("temp_1")).await else {
            panic!("create should succeed");
        };
        assert!(svc.delete(&scope(), &created.id).await.is_ok());
        assert!(svc.cached(&scope()).is_empty());
    }

    #[tokio::test]
    async fn failure_leaves_cache_and_surfaces_server_message() {
        let bus = EventBus::new(16);
        let ok = PolicyService::new(Arc::new(MemoryBackend::default()), bus.clone());
        let Ok(listed) = ok.list(&scope()).await else {
            panic!("list should succeed");
        };
        assert!(listed.is_empty());

        let failing = PolicyService::new(
            Arc::new(MemoryBackend::failing(409, "duplicate policy")),
            bus.clone(),
        );
        let mut rx = bus.subscribe();

        let result = failing.create(&scope(), &draft("temp_1")).await;
        assert!(matches!(result, Err(GatewayError::BackendApi { status: 409, .. })));
        assert!(failing.cached(&scope()).is_empty());

        let Ok(FeedEvent::Notification { notification }) = rx.try_recv() else {
            panic!("expected a notification");
        };
        assert_eq!(notification.level, NotificationLevel::Error);
        assert_eq!(notification.message, "duplicate policy");
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_backend() {
        let svc = PolicyService::new(Arc::new(MemoryBackend::default()), EventBus::new(16));
        let result = svc.create(&scope(), &draft("  ")).await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
        let Ok(listed) = svc.list(&scope()).await else {
            panic!("list should succeed");
        };
        assert!(listed.is_empty());
    }

    #[test]
    fn missing_policy_is_named_in_the_message() {
        let err = GatewayError::PolicyNotFound("p-9".to_string());
        assert_eq!(user_message(&err), "policy not found: p-9");
    }

    #[test]
    fn generic_message_for_transport_errors() {
        let err = GatewayError::BackendUnavailable("connection refused".to_string());
        assert_eq!(user_message(&err), GENERIC_BACKEND_MESSAGE);
    }
}
