//! Database operations for pull requests.

use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::entity::pull_request::{self, ActiveModel, Entity as PullRequest};
use crate::error::{AppError, AppResult};
use crate::models::github::GitHubPullRequest;

/// Insert or update a pull request keyed by its GitHub id.
///
/// The owning repository and author are fixed when the row is first
/// created; later deliveries only refresh the mutable fields.
pub async fn upsert<C: ConnectionTrait>(
    db: &C,
    data: &GitHubPullRequest,
    repository_id: i32,
    user_id: i32,
) -> AppResult<pull_request::Model> {
    let model = ActiveModel {
        github_id: Set(data.id),
        number: Set(data.number),
        repository_id: Set(repository_id),
        user_id: Set(user_id),
        title: Set(data.title.clone()),
        body: Set(data.body.clone()),
        state: Set(data.state.clone()),
        created_at: Set(data.created_at),
        updated_at: Set(data.updated_at),
        merged: Set(data.is_merged()),
        merged_at: Set(data.merged_at),
        head_ref: Set(data.head.git_ref.clone()),
        head_sha: Set(data.head.sha.clone()),
        base_ref: Set(data.base.git_ref.clone()),
        base_sha: Set(data.base.sha.clone()),
        ..Default::default()
    };

    PullRequest::insert(model)
        .on_conflict(
            OnConflict::column(pull_request::Column::GithubId)
                .update_columns([
                    pull_request::Column::Title,
                    pull_request::Column::Body,
                    pull_request::Column::State,
                    pull_request::Column::CreatedAt,
                    pull_request::Column::UpdatedAt,
                    pull_request::Column::Merged,
                    pull_request::Column::MergedAt,
                    pull_request::Column::HeadRef,
                    pull_request::Column::HeadSha,
                    pull_request::Column::BaseRef,
                    pull_request::Column::BaseSha,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    PullRequest::find()
        .filter(pull_request::Column::GithubId.eq(data.id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::Database(format!("Pull request {} missing after upsert", data.id)))
}

/// Pull requests of a repository, most recently updated first.
pub async fn list_for_repository<C: ConnectionTrait>(
    db: &C,
    repository_id: i32,
    limit: u64,
) -> AppResult<Vec<pull_request::Model>> {
    Ok(PullRequest::find()
        .filter(pull_request::Column::RepositoryId.eq(repository_id))
        .order_by_desc(pull_request::Column::UpdatedAt)
        .limit(limit)
        .all(db)
        .await?)
}

pub async fn find_many<C: ConnectionTrait>(
    db: &C,
    ids: Vec<i32>,
) -> AppResult<Vec<pull_request::Model>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(PullRequest::find()
        .filter(pull_request::Column::Id.is_in(ids))
        .all(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{repositories, test_support::memory_pool, users};
    use crate::models::github::{GitHubAccount, GitHubRefPoint, GitHubRepository};
    use chrono::{TimeZone, Utc};

    fn pr(github_id: i64, title: &str, state: &str, day: u32) -> GitHubPullRequest {
        GitHubPullRequest {
            id: github_id,
            number: github_id as i32,
            title: title.to_string(),
            body: None,
            state: state.to_string(),
            created_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            updated_at: Some(Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()),
            merged: None,
            merged_at: None,
            user: None,
            head: GitHubRefPoint {
                git_ref: Some("feature/x".to_string()),
                sha: Some("abc".to_string()),
            },
            base: GitHubRefPoint::default(),
        }
    }

    async fn seed(db: &DatabaseConnection) -> (i32, i32) {
        let repo = repositories::upsert(
            db,
            &GitHubRepository {
                id: 1,
                name: "demo".to_string(),
                full_name: "octo/demo".to_string(),
                private: false,
            },
        )
        .await
        .unwrap();
        let user = users::upsert(
            db,
            &GitHubAccount {
                id: 2,
                login: "octocat".to_string(),
                account_type: "User".to_string(),
            },
        )
        .await
        .unwrap();
        (repo.id, user.id)
    }

    #[tokio::test]
    async fn test_upsert_updates_mutable_fields() {
        let pool = memory_pool().await;
        let db = pool.connection();
        let (repo_id, user_id) = seed(db).await;

        let first = upsert(db, &pr(500, "Draft", "open", 1), repo_id, user_id)
            .await
            .unwrap();
        let second = upsert(db, &pr(500, "Final", "closed", 2), repo_id, user_id)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.title, "Final");
        assert_eq!(second.state, "closed");
        assert_eq!(PullRequest::find().count(db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_for_repository_orders_by_updated_at() {
        let pool = memory_pool().await;
        let db = pool.connection();
        let (repo_id, user_id) = seed(db).await;

        upsert(db, &pr(1, "old", "open", 1), repo_id, user_id).await.unwrap();
        upsert(db, &pr(2, "new", "open", 5), repo_id, user_id).await.unwrap();
        upsert(db, &pr(3, "mid", "open", 3), repo_id, user_id).await.unwrap();

        let listed = list_for_repository(db, repo_id, 2).await.unwrap();
        let titles: Vec<_> = listed.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "mid"]);
    }
}
