//! Database operations for repositories.

use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::entity::repository::{self, ActiveModel, Entity as Repository};
use crate::error::{AppError, AppResult};
use crate::models::github::GitHubRepository;

/// Insert a repository, or update it when its GitHub id is already known.
///
/// A single `INSERT .. ON CONFLICT` statement, so concurrent first
/// deliveries for the same repository both succeed.
pub async fn upsert<C: ConnectionTrait>(
    db: &C,
    data: &GitHubRepository,
) -> AppResult<repository::Model> {
    let model = ActiveModel {
        github_id: Set(data.id),
        name: Set(data.name.clone()),
        full_name: Set(data.full_name.clone()),
        private: Set(data.private),
        ..Default::default()
    };

    Repository::insert(model)
        .on_conflict(
            OnConflict::column(repository::Column::GithubId)
                .update_columns([
                    repository::Column::Name,
                    repository::Column::FullName,
                    repository::Column::Private,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    find_by_github_id(db, data.id).await?.ok_or_else(|| {
        AppError::Database(format!("Repository {} missing after upsert", data.id))
    })
}

pub async fn find_by_github_id<C: ConnectionTrait>(
    db: &C,
    github_id: i64,
) -> AppResult<Option<repository::Model>> {
    Ok(Repository::find()
        .filter(repository::Column::GithubId.eq(github_id))
        .one(db)
        .await?)
}

/// All repositories, in insertion order.
pub async fn list_all<C: ConnectionTrait>(db: &C) -> AppResult<Vec<repository::Model>> {
    Ok(Repository::find()
        .order_by_asc(repository::Column::Id)
        .all(db)
        .await?)
}

pub async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> AppResult<Option<repository::Model>> {
    Ok(Repository::find_by_id(id).one(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;

    fn repo(name: &str, private: bool) -> GitHubRepository {
        GitHubRepository {
            id: 42,
            name: name.to_string(),
            full_name: format!("octo/{}", name),
            private,
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_and_updates_fields() {
        let pool = memory_pool().await;
        let db = pool.connection();

        let first = upsert(db, &repo("demo", false)).await.unwrap();
        let second = upsert(db, &repo("renamed", true)).await.unwrap();

        assert_eq!(first.id, second.id);
        let all = list_all(db).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "renamed");
        assert_eq!(all[0].full_name, "octo/renamed");
        assert!(all[0].private);
    }

    #[tokio::test]
    async fn test_find_by_id_missing() {
        let pool = memory_pool().await;
        assert!(find_by_id(pool.connection(), 99).await.unwrap().is_none());
    }
}
