//! Database management endpoints.
//!
//! Configuration changes are written to `.env` and take effect on restart;
//! the running pool is never swapped.

use std::path::Path;

use actix_web::{HttpResponse, get, post, web};
use secrecy::ExposeSecret;
use tracing::info;

use crate::config::{Config, DbType};
use crate::db::{DbPool, connection_check};
use crate::error::{AppError, AppResult};
use crate::models::OperationResult;
use crate::models::database::{CreateSqliteParams, DatabaseConfigRequest, DatabaseInfo};
use crate::models::settings::ConfigUpdateResponse;
use crate::services::SettingsService;

/// Backend and location of the running database.
#[utoipa::path(
    get,
    path = "/api/database/info",
    tag = "Database",
    responses(
        (status = 200, description = "Database info", body = DatabaseInfo)
    )
)]
#[get("/database/info")]
pub async fn database_info(config: web::Data<Config>, pool: web::Data<DbPool>) -> HttpResponse {
    HttpResponse::Ok().json(DatabaseInfo {
        db_type: config.database.db_type.to_string(),
        location: config.database.redacted_location(),
        connected: pool.ping().await.is_ok(),
    })
}

/// Try connecting to a database without changing anything.
///
/// A SQLite path must already exist; it is opened read-only.
#[utoipa::path(
    post,
    path = "/api/database/test-connection",
    tag = "Database",
    request_body = DatabaseConfigRequest,
    responses(
        (status = 200, description = "Outcome of the attempt", body = OperationResult),
        (status = 400, description = "Unsupported type or bad port", body = crate::error::ErrorResponse)
    )
)]
#[post("/database/test-connection")]
pub async fn test_connection(body: web::Json<DatabaseConfigRequest>) -> AppResult<HttpResponse> {
    let settings = body.to_settings()?;
    Ok(HttpResponse::Ok().json(connection_check::test_connection(&settings).await))
}

/// Verify a database and write its coordinates to `.env`.
#[utoipa::path(
    post,
    path = "/api/database/update-config",
    tag = "Database",
    request_body = DatabaseConfigRequest,
    responses(
        (status = 200, description = "Configuration written", body = ConfigUpdateResponse),
        (status = 400, description = "Connection failed", body = crate::error::ErrorResponse)
    )
)]
#[post("/database/update-config")]
pub async fn update_database_config(
    settings_service: web::Data<SettingsService>,
    body: web::Json<DatabaseConfigRequest>,
) -> AppResult<HttpResponse> {
    let settings = body.to_settings()?;

    let check = connection_check::test_connection(&settings).await;
    if !check.success {
        return Err(AppError::InvalidInput(check.message));
    }

    let mut pairs = vec![("DB_TYPE".to_string(), settings.db_type.as_str().to_string())];
    if settings.db_type == DbType::Sqlite {
        pairs.push((
            "GITHUB_EVENTS_DB".to_string(),
            settings.path.display().to_string(),
        ));
    } else {
        pairs.extend([
            ("DB_HOST".to_string(), settings.host.clone()),
            ("DB_PORT".to_string(), settings.port.to_string()),
            ("DB_NAME".to_string(), settings.name.clone()),
            ("DB_USER".to_string(), settings.user.clone()),
            (
                "DB_PASSWORD".to_string(),
                settings.password.expose_secret().to_string(),
            ),
        ]);
    }

    settings_service.set_values(&pairs, true)?;
    info!(
        "Database configuration switched to {} at {}",
        settings.db_type,
        settings.redacted_location()
    );

    Ok(HttpResponse::Ok().json(ConfigUpdateResponse::new(
        format!(
            "Database configuration updated to {}. Restart the server to apply.",
            settings.db_type
        ),
        true,
    )))
}

/// Create a new SQLite file with the event schema.
#[utoipa::path(
    post,
    path = "/api/database/create-sqlite",
    tag = "Database",
    params(CreateSqliteParams),
    responses(
        (status = 200, description = "Database created", body = OperationResult),
        (status = 400, description = "File already exists", body = crate::error::ErrorResponse)
    )
)]
#[post("/database/create-sqlite")]
pub async fn create_sqlite(query: web::Query<CreateSqliteParams>) -> AppResult<HttpResponse> {
    if query.db_path.trim().is_empty() {
        return Err(AppError::InvalidInput("db_path is required".to_string()));
    }
    let result = connection_check::create_sqlite_database(Path::new(&query.db_path)).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Configure database management routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(database_info)
        .service(test_connection)
        .service(update_database_config)
        .service(create_sqlite);
}
