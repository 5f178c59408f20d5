//! Database module providing connection management, migrations, and queries.

pub mod connection_check;
pub mod events;
pub mod pull_requests;
pub mod repositories;
pub mod users;

use std::path::Path;
use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;

use crate::config::{DatabaseSettings, DbType};
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;

/// Database connection pool wrapper.
/// SeaORM's `DatabaseConnection` is already pooled and cheap to clone.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Connect using the configured backend.
    pub async fn new(settings: &DatabaseSettings) -> AppResult<Self> {
        if settings.db_type == DbType::Sqlite {
            ensure_parent_dir(&settings.path)?;
        }

        let mut options = ConnectOptions::new(settings.connection_url());
        options
            .max_connections(settings.max_connections)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(options).await.map_err(|e| {
            AppError::Database(format!(
                "Failed to connect to {} at {}: {}",
                settings.db_type,
                settings.redacted_location(),
                e
            ))
        })?;

        Ok(Self { conn })
    }

    /// Wrap an existing connection (used by tests with `sqlite::memory:`).
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Apply all pending migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        Migrator::up(&self.conn, None)
            .await
            .map_err(|e| AppError::Database(format!("Failed to run migrations: {}", e)))
    }

    /// Get the underlying SeaORM connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Run `SELECT 1` against the database.
    pub async fn ping(&self) -> AppResult<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one_raw(Statement::from_string(backend, "SELECT 1".to_owned()))
            .await?;
        Ok(())
    }
}

/// Create the parent directory of a SQLite file if needed.
pub(crate) fn ensure_parent_dir(path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::Database(format!("Failed to create database directory: {}", e))
        })?;
    }
    Ok(())
}
