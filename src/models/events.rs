//! Event feed response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

use super::github::GitHubCommit;

/// `?limit=` query parameter.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitParams {
    /// Maximum number of rows to return
    pub limit: Option<u64>,
}

impl LimitParams {
    /// Resolve the limit, rejecting values outside `1..=max`.
    pub fn resolve(&self, default: u64, max: u64) -> AppResult<u64> {
        match self.limit {
            None => Ok(default),
            Some(l) if (1..=max).contains(&l) => Ok(l),
            Some(l) => Err(AppError::InvalidInput(format!(
                "limit must be between 1 and {}, got {}",
                max, l
            ))),
        }
    }
}

/// PR summary embedded in a PR event.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrEventPullRequest {
    pub id: i32,
    pub number: i32,
    pub title: String,
    pub state: String,
    pub created_at: Option<DateTime<Utc>>,
    pub merged: bool,
    pub head_ref: Option<String>,
    pub base_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrEventRepository {
    pub id: i32,
    pub name: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrEventUser {
    pub id: i32,
    pub login: String,
}

/// Pull request event with its PR, repository and author.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrEventResponse {
    pub id: i32,
    pub event_type: String,
    pub created_at: DateTime<Utc>,
    pub pull_request: PrEventPullRequest,
    pub repository: PrEventRepository,
    pub user: PrEventUser,
    #[schema(value_type = Option<Object>)]
    pub payload: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BranchEventResponse {
    pub id: i32,
    pub event_type: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub created_at: DateTime<Utc>,
    pub repository_id: i32,
    #[schema(value_type = Option<Object>)]
    pub payload: Option<serde_json::Value>,
}

impl From<crate::entity::branch_event::Model> for BranchEventResponse {
    fn from(m: crate::entity::branch_event::Model) -> Self {
        Self {
            id: m.id,
            event_type: m.event_type,
            git_ref: m.git_ref,
            created_at: m.created_at,
            repository_id: m.repository_id,
            payload: m.payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PushEventResponse {
    pub id: i32,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub before: String,
    pub after: String,
    pub created: bool,
    pub deleted: bool,
    pub forced: bool,
    pub created_at: DateTime<Utc>,
    pub repository_id: i32,
    pub sender_id: i32,
    #[schema(value_type = Vec<Object>)]
    pub commits: Vec<GitHubCommit>,
}

impl From<crate::entity::push_event::Model> for PushEventResponse {
    fn from(m: crate::entity::push_event::Model) -> Self {
        // Rows written by this service always hold a commit array
        let commits = serde_json::from_value(m.commits).unwrap_or_default();
        Self {
            id: m.id,
            git_ref: m.git_ref,
            before: m.before_sha,
            after: m.after_sha,
            created: m.created,
            deleted: m.deleted,
            forced: m.forced,
            created_at: m.created_at,
            repository_id: m.repository_id,
            sender_id: m.sender_id,
            commits,
        }
    }
}

/// Entry of the combined feed, tagged with `event_category`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "event_category", rename_all = "snake_case")]
pub enum CombinedEvent {
    PullRequest(PrEventResponse),
    Branch(BranchEventResponse),
    Push(PushEventResponse),
}

impl CombinedEvent {
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::PullRequest(e) => e.created_at,
            Self::Branch(e) => e.created_at,
            Self::Push(e) => e.created_at,
        }
    }

    /// Row id within the event's own table.
    pub fn id(&self) -> i32 {
        match self {
            Self::PullRequest(e) => e.id,
            Self::Branch(e) => e.id,
            Self::Push(e) => e.id,
        }
    }

    fn category_rank(&self) -> u8 {
        match self {
            Self::PullRequest(_) => 0,
            Self::Branch(_) => 1,
            Self::Push(_) => 2,
        }
    }
}

/// Merge the three category feeds newest first and keep `limit` entries.
///
/// Equal timestamps order by category (pull request, branch, push), then
/// by descending row id.
pub fn combine_events(
    pr_events: Vec<PrEventResponse>,
    branch_events: Vec<BranchEventResponse>,
    push_events: Vec<PushEventResponse>,
    limit: usize,
) -> Vec<CombinedEvent> {
    let mut combined: Vec<CombinedEvent> = pr_events
        .into_iter()
        .map(CombinedEvent::PullRequest)
        .chain(branch_events.into_iter().map(CombinedEvent::Branch))
        .chain(push_events.into_iter().map(CombinedEvent::Push))
        .collect();

    combined.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| a.category_rank().cmp(&b.category_rank()))
            .then_with(|| b.id().cmp(&a.id()))
    });
    combined.truncate(limit);
    combined
}

/// Entry of a PR's event history.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrHistoryEvent {
    pub id: i32,
    pub event_type: String,
    pub created_at: DateTime<Utc>,
    #[schema(value_type = Option<Object>)]
    pub payload: Option<serde_json::Value>,
}

impl From<crate::entity::pr_event::Model> for PrHistoryEvent {
    fn from(m: crate::entity::pr_event::Model) -> Self {
        Self {
            id: m.id,
            event_type: m.event_type,
            created_at: m.created_at,
            payload: m.payload,
        }
    }
}
