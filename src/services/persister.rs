//! Maps GitHub webhook payloads onto database rows.
//!
//! Write order is always repository, then user(s), then pull request, then
//! the event row, so every foreign key points at an existing row. There is
//! no transaction spanning these writes.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::db::{DbPool, events, pull_requests, repositories, users};
use crate::error::AppResult;
use crate::models::github::{PullRequestPayload, PushPayload, RefPayload};

/// What the persister did with a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    PullRequest,
    Push,
    /// Push to a non-branch ref (tags)
    IgnoredRef,
    Branch,
    /// No storage rule for this event key
    Skipped,
}

#[derive(Clone)]
pub struct EventPersister {
    pool: DbPool,
}

impl EventPersister {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Store an event according to its key (`pull_request:opened`, `push`, ...).
    pub async fn persist(
        &self,
        event_key: &str,
        payload: &Value,
        received_at: DateTime<Utc>,
    ) -> AppResult<PersistOutcome> {
        if let Some(action) = event_key.strip_prefix("pull_request:") {
            let data: PullRequestPayload = serde_json::from_value(payload.clone())?;
            self.store_pull_request(action, &data, received_at).await?;
            return Ok(PersistOutcome::PullRequest);
        }

        match event_key {
            "push" => {
                let data: PushPayload = serde_json::from_value(payload.clone())?;
                if !data.is_branch_push() {
                    debug!("Push event is not to a branch: {}", data.git_ref);
                    return Ok(PersistOutcome::IgnoredRef);
                }
                self.store_push(&data, received_at).await?;
                Ok(PersistOutcome::Push)
            }
            "create" | "delete" if payload["ref_type"] == "branch" => {
                let data: RefPayload = serde_json::from_value(payload.clone())?;
                self.store_branch(event_key, &data, received_at).await?;
                Ok(PersistOutcome::Branch)
            }
            _ => {
                debug!("Event type {} not configured for storage", event_key);
                Ok(PersistOutcome::Skipped)
            }
        }
    }

    async fn store_pull_request(
        &self,
        action: &str,
        data: &PullRequestPayload,
        received_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let db = self.pool.connection();

        let repo = repositories::upsert(db, &data.repository).await?;
        let sender = users::upsert(db, &data.sender).await?;
        let author = match &data.pull_request.user {
            Some(user) if user.id != data.sender.id => users::upsert(db, user).await?,
            _ => sender.clone(),
        };
        let pr = pull_requests::upsert(db, &data.pull_request, repo.id, author.id).await?;

        let mut payload = json!({ "sender": sender.login });
        if let Some(label) = &data.label {
            payload["label"] = json!({ "name": label.name, "color": label.color });
        }

        events::insert_pr_event(db, pr.id, action, Some(payload), received_at).await?;
        info!(
            "Stored PR event: {} for PR #{} in {}",
            action, data.pull_request.number, repo.full_name
        );
        Ok(())
    }

    async fn store_push(&self, data: &PushPayload, received_at: DateTime<Utc>) -> AppResult<()> {
        let db = self.pool.connection();

        let repo = repositories::upsert(db, &data.repository).await?;
        let sender = users::upsert(db, &data.sender).await?;

        let row = events::NewPushEvent {
            git_ref: &data.git_ref,
            before: &data.before,
            after: &data.after,
            created: data.created,
            deleted: data.deleted,
            forced: data.forced,
            commits: &data.commits,
        };
        events::insert_push_event(db, repo.id, sender.id, row, received_at).await?;

        // A push that creates or deletes a ref is also a branch lifecycle event
        let lifecycle = if data.created {
            Some("created")
        } else if data.deleted {
            Some("deleted")
        } else {
            None
        };
        if let Some(event_type) = lifecycle {
            events::insert_branch_event(db, repo.id, event_type, &data.git_ref, None, received_at)
                .await?;
        }

        info!("Stored push event for {} in {}", data.git_ref, repo.full_name);
        Ok(())
    }

    async fn store_branch(
        &self,
        event_name: &str,
        data: &RefPayload,
        received_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let db = self.pool.connection();

        let repo = repositories::upsert(db, &data.repository).await?;
        let full_ref = data.full_ref();
        let payload = json!({ "sender": data.sender.login });

        events::insert_branch_event(db, repo.id, event_name, &full_ref, Some(payload), received_at)
            .await?;
        info!(
            "Stored branch event: {} for {} in {}",
            event_name, full_ref, repo.full_name
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;
    use crate::entity::{branch_event, pr_event, push_event, user};
    use sea_orm::{EntityTrait, PaginatorTrait};

    fn pr_payload(action: &str, label: Option<Value>) -> Value {
        let mut payload = json!({
            "action": action,
            "pull_request": {
                "id": 1001,
                "number": 5,
                "title": "Add caching",
                "state": "open",
                "user": {"id": 20, "login": "author", "type": "User"},
                "head": {"ref": "feature/cache", "sha": "aaa"},
                "base": {"ref": "main", "sha": "bbb"}
            },
            "repository": {"id": 1, "name": "demo", "full_name": "octo/demo", "private": false},
            "sender": {"id": 10, "login": "reviewer", "type": "User"}
        });
        if let Some(label) = label {
            payload["label"] = label;
        }
        payload
    }

    #[tokio::test]
    async fn test_pull_request_event_stores_author_and_label() {
        let pool = memory_pool().await;
        let persister = EventPersister::new(pool.clone());
        let label = json!({"name": "bug", "color": "d73a4a", "id": 3});

        let outcome = persister
            .persist("pull_request:labeled", &pr_payload("labeled", Some(label)), Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, PersistOutcome::PullRequest);

        let db = pool.connection();
        assert_eq!(user::Entity::find().count(db).await.unwrap(), 2);

        let events = events::recent_pr_events(db, 10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "labeled");
        assert_eq!(events[0].user.login, "author");
        let payload = events[0].payload.as_ref().unwrap();
        assert_eq!(payload["label"], json!({"name": "bug", "color": "d73a4a"}));
        assert_eq!(payload["sender"], "reviewer");
    }

    #[tokio::test]
    async fn test_push_creating_branch_synthesizes_branch_event() {
        let pool = memory_pool().await;
        let persister = EventPersister::new(pool.clone());
        let payload = json!({
            "ref": "refs/heads/feature/new",
            "before": "0000000",
            "after": "abc1234",
            "created": true,
            "deleted": false,
            "forced": false,
            "commits": [{
                "id": "abc1234",
                "message": "Initial",
                "timestamp": "2024-01-01T00:00:00Z",
                "author": {"name": "Octo", "email": "octo@example.com", "username": "octocat"},
                "added": ["README.md"],
                "removed": [],
                "modified": []
            }],
            "repository": {"id": 1, "name": "demo", "full_name": "octo/demo"},
            "sender": {"id": 10, "login": "octocat"}
        });

        let outcome = persister.persist("push", &payload, Utc::now()).await.unwrap();
        assert_eq!(outcome, PersistOutcome::Push);

        let db = pool.connection();
        assert_eq!(push_event::Entity::find().count(db).await.unwrap(), 1);
        let branches = branch_event::Entity::find().all(db).await.unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].event_type, "created");
        assert_eq!(branches[0].git_ref, "refs/heads/feature/new");
    }

    #[tokio::test]
    async fn test_tag_push_is_ignored() {
        let pool = memory_pool().await;
        let persister = EventPersister::new(pool.clone());
        let payload = json!({
            "ref": "refs/tags/v1.0.0",
            "before": "0",
            "after": "1",
            "repository": {"id": 1, "name": "demo", "full_name": "octo/demo"},
            "sender": {"id": 10, "login": "octocat"}
        });

        let outcome = persister.persist("push", &payload, Utc::now()).await.unwrap();
        assert_eq!(outcome, PersistOutcome::IgnoredRef);
        assert_eq!(
            push_event::Entity::find().count(pool.connection()).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_branch_create_and_tag_create() {
        let pool = memory_pool().await;
        let persister = EventPersister::new(pool.clone());
        let mut payload = json!({
            "ref": "feature/login",
            "ref_type": "branch",
            "repository": {"id": 1, "name": "demo", "full_name": "octo/demo"},
            "sender": {"id": 10, "login": "octocat"}
        });

        let outcome = persister.persist("create", &payload, Utc::now()).await.unwrap();
        assert_eq!(outcome, PersistOutcome::Branch);

        payload["ref_type"] = json!("tag");
        let outcome = persister.persist("create", &payload, Utc::now()).await.unwrap();
        assert_eq!(outcome, PersistOutcome::Skipped);

        let stored = branch_event::Entity::find().all(pool.connection()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].git_ref, "refs/heads/feature/login");
        assert_eq!(stored[0].payload, Some(json!({"sender": "octocat"})));
    }

    #[tokio::test]
    async fn test_malformed_pull_request_payload_is_an_error() {
        let pool = memory_pool().await;
        let persister = EventPersister::new(pool.clone());

        let result = persister
            .persist("pull_request:opened", &json!({"action": "opened"}), Utc::now())
            .await;
        assert!(result.is_err());
        assert_eq!(
            pr_event::Entity::find().count(pool.connection()).await.unwrap(),
            0
        );
    }
}
