//! Create pr_events table.

use sea_orm_migration::prelude::*;

use super::m20250301_000003_create_pull_requests::PullRequest;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PrEvent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PrEvent::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PrEvent::EventType).string_len(50).not_null())
                    .col(
                        ColumnDef::new(PrEvent::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PrEvent::Payload).json())
                    .col(ColumnDef::new(PrEvent::PullRequestId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pr_events_pull_request")
                            .from(PrEvent::Table, PrEvent::PullRequestId)
                            .to(PullRequest::Table, PullRequest::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pr_events_created_at")
                    .table(PrEvent::Table)
                    .col(PrEvent::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pr_events_pull_request")
                    .table(PrEvent::Table)
                    .col(PrEvent::PullRequestId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PrEvent::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PrEvent {
    #[sea_orm(iden = "pr_events")]
    Table,
    Id,
    EventType,
    CreatedAt,
    Payload,
    PullRequestId,
}
