//! GitHub webhook payload shapes.
//!
//! Only the fields that are persisted are modelled; everything else in the
//! payload is ignored by serde.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository object embedded in every event.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepository {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
}

/// User or organization account (`sender`, PR `user`).
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubAccount {
    pub id: i64,
    pub login: String,
    #[serde(rename = "type", default = "default_account_type")]
    pub account_type: String,
}

fn default_account_type() -> String {
    "User".to_string()
}

/// `head` / `base` of a pull request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubRefPoint {
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    pub sha: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubPullRequest {
    pub id: i64,
    pub number: i32,
    #[serde(default)]
    pub title: String,
    pub body: Option<String>,
    #[serde(default = "default_pr_state")]
    pub state: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged: Option<bool>,
    pub merged_at: Option<DateTime<Utc>>,
    pub user: Option<GitHubAccount>,
    #[serde(default)]
    pub head: GitHubRefPoint,
    #[serde(default)]
    pub base: GitHubRefPoint,
}

fn default_pr_state() -> String {
    "open".to_string()
}

impl GitHubPullRequest {
    pub fn is_merged(&self) -> bool {
        self.merged.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubLabel {
    pub name: String,
    #[serde(default)]
    pub color: String,
}

/// `pull_request` event.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestPayload {
    pub action: String,
    pub pull_request: GitHubPullRequest,
    pub repository: GitHubRepository,
    pub sender: GitHubAccount,
    pub label: Option<GitHubLabel>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitAuthor {
    pub name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
}

/// Commit entry of a push; stored verbatim in `push_events.commits`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubCommit {
    pub id: String,
    #[serde(default)]
    pub message: String,
    pub timestamp: Option<String>,
    #[serde(default)]
    pub author: CommitAuthor,
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
    #[serde(default)]
    pub modified: Vec<String>,
}

/// `push` event.
#[derive(Debug, Clone, Deserialize)]
pub struct PushPayload {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub before: String,
    pub after: String,
    #[serde(default)]
    pub created: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub forced: bool,
    #[serde(default)]
    pub commits: Vec<GitHubCommit>,
    pub repository: GitHubRepository,
    pub sender: GitHubAccount,
}

impl PushPayload {
    /// Branch pushes only; tag pushes are ignored.
    pub fn is_branch_push(&self) -> bool {
        self.git_ref.starts_with("refs/heads/")
    }
}

/// `create` / `delete` event.
#[derive(Debug, Clone, Deserialize)]
pub struct RefPayload {
    /// Short ref name (`feature/x`), not `refs/heads/...`
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub ref_type: String,
    pub repository: GitHubRepository,
    pub sender: GitHubAccount,
}

impl RefPayload {
    pub fn is_branch(&self) -> bool {
        self.ref_type == "branch"
    }

    /// Fully qualified ref as stored in `branch_events.git_ref`.
    pub fn full_ref(&self) -> String {
        format!("refs/heads/{}", self.git_ref)
    }
}
