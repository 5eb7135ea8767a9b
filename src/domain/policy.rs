//! Threshold automation rules owned by the policy backend.
//!
//! The gateway never evaluates policies. It only relays them between the
//! operator UI and the backend, so these types mirror the backend's JSON.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Comparison applied to a sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ConditionOperator {
    /// Reading strictly above the value.
    #[serde(rename = ">")]
    GreaterThan,
    /// Reading strictly below the value.
    #[serde(rename = "<")]
    LessThan,
    /// Reading at or above the value.
    #[serde(rename = ">=")]
    GreaterOrEqual,
    /// Reading at or below the value.
    #[serde(rename = "<=")]
    LessOrEqual,
    /// Reading equal to the value.
    #[serde(rename = "==")]
    Equal,
    /// Reading different from the value.
    #[serde(rename = "!=")]
    NotEqual,
}

/// `{operator, value}` condition over one sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PolicyCondition {
    /// Comparison operator.
    pub operator: ConditionOperator,
    /// Threshold the reading is compared against.
    pub value: f64,
}

/// `{resource_id, actuator_type, command}` action on one actuator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PolicyAction {
    /// Target actuator resource.
    pub resource_id: String,
    /// Actuator kind (e.g. `fan`, `cooling_unit`).
    pub actuator_type: String,
    /// Backend-specific command object (e.g. `{"status": "ON", "speed": 80}`).
    #[schema(value_type = Object)]
    pub command: serde_json::Value,
}

/// A policy as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Policy {
    /// Backend-assigned identifier.
    pub id: String,
    /// Operator-facing description.
    #[serde(default)]
    pub description: String,
    /// Room the policy belongs to.
    pub room_id: String,
    /// Rack scope, when the policy targets a rack.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rack_id: Option<String>,
    /// Smart-object scope, when the policy targets one device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    /// Sensor whose reading is tested.
    pub sensor_id: String,
    /// Trigger condition.
    pub condition: PolicyCondition,
    /// Action applied when the condition holds.
    pub action: PolicyAction,
}

/// Policy body sent on create/update. The backend assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PolicyDraft {
    /// Operator-facing description.
    #[serde(default)]
    pub description: String,
    /// Sensor whose reading is tested.
    pub sensor_id: String,
    /// Trigger condition.
    pub condition: PolicyCondition,
    /// Action applied when the condition holds.
    pub action: PolicyAction,
}

/// Where in the facility hierarchy a policy collection lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolicyScope {
    /// Room identifier (always present).
    pub room_id: String,
    /// Optional rack identifier.
    pub rack_id: Option<String>,
    /// Optional smart-object identifier. Only meaningful under a rack.
    pub object_id: Option<String>,
}

impl PolicyScope {
    /// Scope covering a whole room.
    #[must_use]
    pub fn room(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            rack_id: None,
            object_id: None,
        }
    }

    /// Narrows the scope to a rack.
    #[must_use]
    pub fn with_rack(mut self, rack_id: impl Into<String>) -> Self {
        self.rack_id = Some(rack_id.into());
        self
    }

    /// Narrows the scope to a smart object.
    #[must_use]
    pub fn with_object(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }

    /// Unescaped path segments of the policy collection for this scope.
    ///
    /// Identifiers are returned as single segments even when they contain
    /// `/`; URL builders must escape them.
    #[must_use]
    pub fn collection_segments(&self) -> Vec<&str> {
        let mut segments = vec!["rooms", self.room_id.as_str()];
        if let Some(rack) = &self.rack_id {
            segments.extend(["racks", rack.as_str()]);
        }
        if let Some(object) = &self.object_id {
            segments.extend(["objects", object.as_str()]);
        }
        segments.push("policies");
        segments
    }

    /// Unescaped path segments of one policy within this scope.
    #[must_use]
    pub fn item_segments<'a>(&'a self, policy_id: &'a str) -> Vec<&'a str> {
        let mut segments = self.collection_segments();
        segments.push(policy_id);
        segments
    }

    /// Relative path of the policy collection, for logs and cache keys.
    #[must_use]
    pub fn collection_path(&self) -> String {
        self.collection_segments().join("/")
    }

    /// Relative path of one policy within this scope, for logs.
    #[must_use]
    pub fn item_path(&self, policy_id: &str) -> String {
        self.item_segments(policy_id).join("/")
    }

    /// Builds a full [`Policy`] from a draft and a backend-assigned id.
    #[must_use]
    pub fn materialize(&self, id: String, draft: PolicyDraft) -> Policy {
        Policy {
            id,
            description: draft.description,
            room_id: self.room_id.clone(),
            rack_id: self.rack_id.clone(),
            object_id: self.object_id.clone(),
            sensor_id: draft.sensor_id,
            condition: draft.condition,
            action: draft.action,
        }
    }
}

impl fmt::Display for PolicyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.room_id)?;
        if let Some(rack) = &self.rack_id {
            write!(f, "/{rack}")?;
        }
        if let Some(object) = &self.object_id {
            write!(f, "/{object}")?;
        }
        Ok(())
    }
}
