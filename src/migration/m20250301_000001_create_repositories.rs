//! Create repositories table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Repository::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Repository::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Repository::GithubId).big_integer().not_null())
                    .col(ColumnDef::new(Repository::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Repository::FullName).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Repository::Private)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_repositories_github_id")
                    .table(Repository::Table)
                    .col(Repository::GithubId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Repository::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Repository {
    #[sea_orm(iden = "repositories")]
    Table,
    Id,
    GithubId,
    Name,
    FullName,
    Private,
}
