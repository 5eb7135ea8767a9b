//! Policy DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Policy, PolicyScope};

/// Response body for `GET …/policies`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PolicyListResponse {
    /// Policies of the requested scope.
    pub data: Vec<Policy>,
    /// Number of policies returned.
    pub count: usize,
}

/// Path parameters shared by all policy routes.
///
/// `rack`, `object` and `id` are absent on the shorter route forms.
#[derive(Debug, Deserialize)]
pub struct PolicyPath {
    /// Room identifier.
    pub room: String,
    /// Rack identifier.
    #[serde(default)]
    pub rack: Option<String>,
    /// Smart-object identifier.
    #[serde(default)]
    pub object: Option<String>,
    /// Policy identifier.
    #[serde(default)]
    pub id: Option<String>,
}

impl PolicyPath {
    /// Scope addressed by the path.
    #[must_use]
    pub fn scope(&self) -> PolicyScope {
        PolicyScope {
            room_id: self.room.clone(),
            rack_id: self.rack.clone(),
            object_id: self.object.clone(),
        }
    }
}
