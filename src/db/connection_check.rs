//! Ad-hoc connections used by the database management endpoints.

use std::path::Path;
use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, Statement};

use crate::config::{DatabaseSettings, DbType};
use crate::error::{AppError, AppResult};
use crate::models::OperationResult;

use super::DbPool;

/// Connect to the given database and run `SELECT 1`.
///
/// Never fails; the outcome is reported in the returned result.
/// A missing SQLite file is reported as a failure and is not created.
pub async fn test_connection(settings: &DatabaseSettings) -> OperationResult {
    if settings.db_type == DbType::Sqlite && !settings.path.is_file() {
        return OperationResult::failure(format!(
            "Database file not found at {}",
            settings.path.display()
        ));
    }

    let mut options = ConnectOptions::new(settings.read_only_url());
    options
        .max_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let conn = match Database::connect(options).await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(
                "Connection test to {} failed: {}",
                settings.redacted_location(),
                e
            );
            return OperationResult::failure(format!("Connection failed: {}", e));
        }
    };

    let backend = conn.get_database_backend();
    let outcome = conn
        .query_one_raw(Statement::from_string(backend, "SELECT 1".to_owned()))
        .await;
    let _ = conn.close().await;

    match outcome {
        Ok(_) => OperationResult::success(format!(
            "Successfully connected to {} database at {}",
            settings.db_type,
            settings.redacted_location()
        )),
        Err(e) => OperationResult::failure(format!("Connection failed: {}", e)),
    }
}

/// Create a new SQLite database file with the full schema.
///
/// Refuses to touch an existing file.
pub async fn create_sqlite_database(path: &Path) -> AppResult<OperationResult> {
    if path.exists() {
        return Err(AppError::InvalidInput(format!(
            "Database file already exists at {}",
            path.display()
        )));
    }

    let settings = DatabaseSettings::sqlite(path);
    let pool = DbPool::new(&settings).await?;
    pool.run_migrations().await?;
    let _ = pool.connection().clone().close().await;

    tracing::info!("Created SQLite database at {}", path.display());
    Ok(OperationResult::success(format!(
        "Created SQLite database at {}",
        path.display()
    )))
}
