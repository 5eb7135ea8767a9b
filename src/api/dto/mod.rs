//! Data Transfer Objects for REST request/response serialization.

pub mod alert_dto;
pub mod policy_dto;

pub use alert_dto::*;
pub use policy_dto::*;
