//! Service layer: business logic orchestration.
//!
//! [`AlertFeedService`] turns broker messages into the live alert list and
//! [`PolicyService`] relays policy CRUD to the backend. Both report through
//! the [`super::domain::EventBus`].

pub mod feed_service;
pub mod policy_backend;
pub mod policy_service;

pub use feed_service::AlertFeedService;
pub use policy_backend::{HttpPolicyBackend, PolicyBackend};
pub use policy_service::PolicyService;
