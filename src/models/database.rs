//! Database management request/response types.

use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::config::{DatabaseSettings, DbType, defaults};
use crate::error::{AppError, AppResult};

/// Connection parameters submitted by the dashboard.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DatabaseConfigRequest {
    /// `SQLite`, `MySQL` or `PostgreSQL`
    #[serde(rename = "type")]
    pub db_type: String,
    pub path: Option<String>,
    pub host: Option<String>,
    /// Accepted as a string or a number
    #[schema(value_type = Option<String>)]
    pub port: Option<serde_json::Value>,
    pub name: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl DatabaseConfigRequest {
    /// Build connection settings, filling unspecified fields from defaults.
    pub fn to_settings(&self) -> AppResult<DatabaseSettings> {
        let db_type = DbType::parse(&self.db_type).ok_or_else(|| {
            AppError::InvalidInput(format!("Unsupported database type: {}", self.db_type))
        })?;

        let port = match &self.port {
            None | Some(serde_json::Value::Null) => defaults::DB_PORT,
            Some(serde_json::Value::Number(n)) => n
                .as_u64()
                .and_then(|p| u16::try_from(p).ok())
                .ok_or_else(|| AppError::InvalidInput(format!("Invalid port: {}", n)))?,
            Some(serde_json::Value::String(s)) => s
                .trim()
                .parse::<u16>()
                .map_err(|_| AppError::InvalidInput(format!("Invalid port: {}", s)))?,
            Some(other) => {
                return Err(AppError::InvalidInput(format!("Invalid port: {}", other)));
            }
        };

        let path = self
            .path
            .clone()
            .unwrap_or_else(|| defaults::SQLITE_PATH.to_string());

        Ok(DatabaseSettings {
            db_type,
            host: self
                .host
                .clone()
                .unwrap_or_else(|| defaults::DB_HOST.to_string()),
            port,
            name: self
                .name
                .clone()
                .unwrap_or_else(|| defaults::DB_NAME.to_string()),
            user: self
                .user
                .clone()
                .unwrap_or_else(|| defaults::DB_USER.to_string()),
            password: SecretString::from(
                self.password
                    .clone()
                    .unwrap_or_else(|| defaults::DB_PASSWORD.to_string()),
            ),
            ..DatabaseSettings::sqlite(PathBuf::from(path))
        })
    }
}

/// Current database backend as reported by `GET /api/database/info`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DatabaseInfo {
    #[serde(rename = "type")]
    pub db_type: String,
    pub location: String,
    pub connected: bool,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CreateSqliteParams {
    /// Path of the new SQLite file
    pub db_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_port_accepts_string_or_number() {
        let request: DatabaseConfigRequest = serde_json::from_value(json!({
            "type": "MySQL", "host": "db", "port": "3307"
        }))
        .unwrap();
        assert_eq!(request.to_settings().unwrap().port, 3307);

        let request: DatabaseConfigRequest =
            serde_json::from_value(json!({"type": "postgresql", "port": 5432})).unwrap();
        let settings = request.to_settings().unwrap();
        assert_eq!(settings.db_type, DbType::Postgres);
        assert_eq!(settings.port, 5432);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let request: DatabaseConfigRequest =
            serde_json::from_value(json!({"type": "oracle"})).unwrap();
        assert!(matches!(
            request.to_settings(),
            Err(AppError::InvalidInput(_))
        ));
    }
}
