//! Create branch_events table.

use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_repositories::Repository;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BranchEvent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BranchEvent::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BranchEvent::EventType).string_len(50).not_null())
                    .col(ColumnDef::new(BranchEvent::GitRef).string_len(255).not_null())
                    .col(
                        ColumnDef::new(BranchEvent::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BranchEvent::Payload).json())
                    .col(ColumnDef::new(BranchEvent::RepositoryId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_branch_events_repository")
                            .from(BranchEvent::Table, BranchEvent::RepositoryId)
                            .to(Repository::Table, Repository::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_branch_events_created_at")
                    .table(BranchEvent::Table)
                    .col(BranchEvent::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BranchEvent::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum BranchEvent {
    #[sea_orm(iden = "branch_events")]
    Table,
    Id,
    EventType,
    GitRef,
    CreatedAt,
    Payload,
    RepositoryId,
}
