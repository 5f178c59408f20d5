//! Create push_events table.

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
                    .table(PushEvent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PushEvent::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PushEvent::GitRef).string_len(255).not_null())
                    .col(ColumnDef::new(PushEvent::BeforeSha).string_len(255).not_null())
                    .col(ColumnDef::new(PushEvent::AfterSha).string_len(255).not_null())
                    .col(
                        ColumnDef::new(PushEvent::Created)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PushEvent::Deleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PushEvent::Forced)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PushEvent::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PushEvent::Commits).json().not_null())
                    .col(ColumnDef::new(PushEvent::RepositoryId).integer().not_null())
                    .col(ColumnDef::new(PushEvent::SenderId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_push_events_repository")
                            .from(PushEvent::Table, PushEvent::RepositoryId)
                            .to(Repository::Table, Repository::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_push_events_sender")
                            .from(PushEvent::Table, PushEvent::SenderId)
                            .to(User::Table, User::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_push_events_created_at")
                    .table(PushEvent::Table)
                    .col(PushEvent::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PushEvent::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PushEvent {
    #[sea_orm(iden = "push_events")]
    Table,
    Id,
    GitRef,
    BeforeSha,
    AfterSha,
    Created,
    Deleted,
    Forced,
    CreatedAt,
    Commits,
    RepositoryId,
    SenderId,
}
