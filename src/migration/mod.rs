//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_repositories;
mod m20250301_000002_create_users;
mod m20250301_000003_create_pull_requests;
mod m20250301_000004_create_pr_events;
mod m20250301_000005_create_branch_events;
mod m20250301_000006_create_push_events;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_repositories::Migration),
            Box::new(m20250301_000002_create_users::Migration),
            Box::new(m20250301_000003_create_pull_requests::Migration),
            Box::new(m20250301_000004_create_pr_events::Migration),
            Box::new(m20250301_000005_create_branch_events::Migration),
            Box::new(m20250301_000006_create_push_events::Migration),
        ]
    }
}
