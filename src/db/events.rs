//! Database operations for PR, branch and push events.
//!
//! Event rows are immutable once inserted. Every insert takes the time the
//! delivery was received so callers (and tests) control the timestamp.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::*;

use crate::entity::{branch_event, pr_event, push_event, repository};
use crate::error::AppResult;
use crate::models::events::{
    BranchEventResponse, PrEventPullRequest, PrEventRepository, PrEventResponse, PrEventUser,
    PrHistoryEvent, PushEventResponse,
};
use crate::models::github::GitHubCommit;

use super::{pull_requests, users};

pub async fn insert_pr_event<C: ConnectionTrait>(
    db: &C,
    pull_request_id: i32,
    event_type: &str,
    payload: Option<serde_json::Value>,
    received_at: DateTime<Utc>,
) -> AppResult<pr_event::Model> {
    let model = pr_event::ActiveModel {
        event_type: Set(event_type.to_string()),
        created_at: Set(received_at),
        payload: Set(payload),
        pull_request_id: Set(pull_request_id),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

pub async fn insert_branch_event<C: ConnectionTrait>(
    db: &C,
    repository_id: i32,
    event_type: &str,
    git_ref: &str,
    payload: Option<serde_json::Value>,
    received_at: DateTime<Utc>,
) -> AppResult<branch_event::Model> {
    let model = branch_event::ActiveModel {
        event_type: Set(event_type.to_string()),
        git_ref: Set(git_ref.to_string()),
        created_at: Set(received_at),
        payload: Set(payload),
        repository_id: Set(repository_id),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Fields of a push event row besides its owners and timestamp.
#[derive(Debug, Clone)]
pub struct NewPushEvent<'a> {
    pub git_ref: &'a str,
    pub before: &'a str,
    pub after: &'a str,
    pub created: bool,
    pub deleted: bool,
    pub forced: bool,
    pub commits: &'a [GitHubCommit],
}

pub async fn insert_push_event<C: ConnectionTrait>(
    db: &C,
    repository_id: i32,
    sender_id: i32,
    event: NewPushEvent<'_>,
    received_at: DateTime<Utc>,
) -> AppResult<push_event::Model> {
    let model = push_event::ActiveModel {
        git_ref: Set(event.git_ref.to_string()),
        before_sha: Set(event.before.to_string()),
        after_sha: Set(event.after.to_string()),
        created: Set(event.created),
        deleted: Set(event.deleted),
        forced: Set(event.forced),
        created_at: Set(received_at),
        commits: Set(serde_json::to_value(event.commits)?),
        repository_id: Set(repository_id),
        sender_id: Set(sender_id),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Most recent PR events with their pull request, repository and PR author.
pub async fn recent_pr_events<C: ConnectionTrait>(
    db: &C,
    limit: u64,
) -> AppResult<Vec<PrEventResponse>> {
    let events = pr_event::Entity::find()
        .order_by_desc(pr_event::Column::CreatedAt)
        .order_by_desc(pr_event::Column::Id)
        .limit(limit)
        .all(db)
        .await?;

    let pr_ids = unique(events.iter().map(|e| e.pull_request_id));
    let prs: HashMap<i32, _> = pull_requests::find_many(db, pr_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let repo_ids = unique(prs.values().map(|p| p.repository_id));
    let repos: HashMap<i32, repository::Model> = if repo_ids.is_empty() {
        HashMap::new()
    } else {
        repository::Entity::find()
            .filter(repository::Column::Id.is_in(repo_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect()
    };

    let user_ids = unique(prs.values().map(|p| p.user_id));
    let authors: HashMap<i32, _> = users::find_many(db, user_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut result = Vec::with_capacity(events.len());
    for event in events {
        let Some(pr) = prs.get(&event.pull_request_id) else {
            tracing::warn!("PR event {} references missing pull request", event.id);
            continue;
        };
        let (Some(repo), Some(author)) = (repos.get(&pr.repository_id), authors.get(&pr.user_id))
        else {
            tracing::warn!("Pull request {} references missing repository or user", pr.id);
            continue;
        };

        result.push(PrEventResponse {
            id: event.id,
            event_type: event.event_type,
            created_at: event.created_at,
            pull_request: PrEventPullRequest {
                id: pr.id,
                number: pr.number,
                title: pr.title.clone(),
                state: pr.state.clone(),
                created_at: pr.created_at,
                merged: pr.merged,
                head_ref: pr.head_ref.clone(),
                base_ref: pr.base_ref.clone(),
            },
            repository: PrEventRepository {
                id: repo.id,
                name: repo.name.clone(),
                full_name: repo.full_name.clone(),
            },
            user: PrEventUser {
                id: author.id,
                login: author.login.clone(),
            },
            payload: event.payload,
        });
    }

    Ok(result)
}

pub async fn recent_branch_events<C: ConnectionTrait>(
    db: &C,
    limit: u64,
) -> AppResult<Vec<BranchEventResponse>> {
    Ok(branch_event::Entity::find()
        .order_by_desc(branch_event::Column::CreatedAt)
        .order_by_desc(branch_event::Column::Id)
        .limit(limit)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

pub async fn recent_push_events<C: ConnectionTrait>(
    db: &C,
    limit: u64,
) -> AppResult<Vec<PushEventResponse>> {
    Ok(push_event::Entity::find()
        .order_by_desc(push_event::Column::CreatedAt)
        .order_by_desc(push_event::Column::Id)
        .limit(limit)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

/// Event history of one pull request, oldest first.
pub async fn pr_event_history<C: ConnectionTrait>(
    db: &C,
    pull_request_id: i32,
    limit: u64,
) -> AppResult<Vec<PrHistoryEvent>> {
    Ok(pr_event::Entity::find()
        .filter(pr_event::Column::PullRequestId.eq(pull_request_id))
        .order_by_asc(pr_event::Column::CreatedAt)
        .order_by_asc(pr_event::Column::Id)
        .limit(limit)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

fn unique(ids: impl Iterator<Item = i32>) -> Vec<i32> {
    let mut ids: Vec<i32> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
