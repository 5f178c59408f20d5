//! Create pull_requests table.

use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_repositories::Repository;
use super::m20250301_000002_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PullRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PullRequest::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PullRequest::GithubId).big_integer().not_null())
                    .col(ColumnDef::new(PullRequest::Number).integer().not_null())
                    .col(ColumnDef::new(PullRequest::Title).string_len(255).not_null())
                    .col(ColumnDef::new(PullRequest::Body).text())
                    .col(ColumnDef::new(PullRequest::State).string_len(50).not_null())
                    .col(ColumnDef::new(PullRequest::CreatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(PullRequest::UpdatedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(PullRequest::Merged)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(PullRequest::MergedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(PullRequest::HeadRef).string_len(255))
                    .col(ColumnDef::new(PullRequest::HeadSha).string_len(255))
                    .col(ColumnDef::new(PullRequest::BaseRef).string_len(255))
                    .col(ColumnDef::new(PullRequest::BaseSha).string_len(255))
                    .col(ColumnDef::new(PullRequest::RepositoryId).integer().not_null())
                    .col(ColumnDef::new(PullRequest::UserId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pull_requests_repository")
                            .from(PullRequest::Table, PullRequest::RepositoryId)
                            .to(Repository::Table, Repository::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pull_requests_user")
                            .from(PullRequest::Table, PullRequest::UserId)
                            .to(User::Table, User::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pull_requests_github_id")
                    .table(PullRequest::Table)
                    .col(PullRequest::GithubId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Per-repository listing orders by updated_at
        manager
            .create_index(
                Index::create()
                    .name("idx_pull_requests_repository_updated")
                    .table(PullRequest::Table)
                    .col(PullRequest::RepositoryId)
                    .col(PullRequest::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PullRequest::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PullRequest {
    #[sea_orm(iden = "pull_requests")]
    Table,
    Id,
    GithubId,
    Number,
    Title,
    Body,
    State,
    CreatedAt,
    UpdatedAt,
    Merged,
    MergedAt,
    HeadRef,
    HeadSha,
    BaseRef,
    BaseSha,
    RepositoryId,
    UserId,
}
