//! Repository and pull request listings.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RepositoryResponse {
    pub id: i32,
    pub github_id: i64,
    pub name: String,
    pub full_name: String,
    pub private: bool,
}

impl From<crate::entity::repository::Model> for RepositoryResponse {
    fn from(m: crate::entity::repository::Model) -> Self {
        Self {
            id: m.id,
            github_id: m.github_id,
            name: m.name,
            full_name: m.full_name,
            private: m.private,
        }
    }
}

/// Pull request row as listed per repository.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PullRequestResponse {
    pub id: i32,
    pub github_id: i64,
    pub number: i32,
    pub title: String,
    pub state: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub merged: bool,
    pub merged_at: Option<DateTime<Utc>>,
    pub head_ref: Option<String>,
    pub base_ref: Option<String>,
}

impl From<crate::entity::pull_request::Model> for PullRequestResponse {
    fn from(m: crate::entity::pull_request::Model) -> Self {
        Self {
            id: m.id,
            github_id: m.github_id,
            number: m.number,
            title: m.title,
            state: m.state,
            created_at: m.created_at,
            updated_at: m.updated_at,
            merged: m.merged,
            merged_at: m.merged_at,
            head_ref: m.head_ref,
            base_ref: m.base_ref,
        }
    }
}
