//! Database operations for GitHub accounts.

use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::entity::user::{self, ActiveModel, Entity as User};
use crate::error::{AppError, AppResult};
use crate::models::github::GitHubAccount;

/// Find or create a user by GitHub ID. Login and account type are refreshed.
pub async fn upsert<C: ConnectionTrait>(db: &C, data: &GitHubAccount) -> AppResult<user::Model> {
    let model = ActiveModel {
        github_id: Set(data.id),
        login: Set(data.login.clone()),
        account_type: Set(data.account_type.clone()),
        ..Default::default()
    };

    User::insert(model)
        .on_conflict(
            OnConflict::column(user::Column::GithubId)
                .update_columns([user::Column::Login, user::Column::AccountType])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    User::find()
        .filter(user::Column::GithubId.eq(data.id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::Database(format!("User {} missing after upsert", data.login)))
}

/// Fetch several users at once, keyed by local id.
pub async fn find_many<C: ConnectionTrait>(db: &C, ids: Vec<i32>) -> AppResult<Vec<user::Model>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(User::find().filter(user::Column::Id.is_in(ids)).all(db).await?)
}
