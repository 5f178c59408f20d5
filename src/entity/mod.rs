//! SeaORM entity definitions.

pub mod branch_event;
pub mod pr_event;
pub mod pull_request;
pub mod push_event;
pub mod repository;
pub mod user;
