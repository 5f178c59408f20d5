//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};

/// HTTP header carrying the webhook HMAC signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// HTTP header carrying the GitHub event name.
pub const EVENT_HEADER: &str = "X-GitHub-Event";

/// HTTP header carrying the GitHub delivery id.
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";

/// Default values used when a variable is unset.
pub mod defaults {
    pub const HOST: &str = "0.0.0.0";
    pub const API_PORT: u16 = 8001;
    pub const WEBHOOK_PORT: u16 = 8002;
    pub const DB_TYPE: &str = "SQLite";
    pub const SQLITE_PATH: &str = "github_events.db";
    pub const DB_HOST: &str = "localhost";
    pub const DB_PORT: u16 = 3306;
    pub const DB_NAME: &str = "github_events";
    pub const DB_USER: &str = "admin";
    pub const DB_PASSWORD: &str = "password";
    pub const DB_MAX_CONNECTIONS: u32 = 10;
    pub const AUTO_PR_CONFIG: &str = "auto_branch_pr_config.json";
    pub const ENV_FILE: &str = ".env";
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Check if this is a development environment.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check if this is a production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    Sqlite,
    Mysql,
    Postgres,
}

impl DbType {
    /// Parse a backend name as written in `.env` (`SQLite`, `MySQL`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" => Some(Self::Sqlite),
            "mysql" => Some(Self::Mysql),
            "postgres" | "postgresql" => Some(Self::Postgres),
            _ => None,
        }
    }

    /// Canonical spelling written back to `.env`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "SQLite",
            Self::Mysql => "MySQL",
            Self::Postgres => "PostgreSQL",
        }
    }
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub db_type: DbType,
    /// SQLite file path (ignored for server backends)
    pub path: PathBuf,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: SecretString,
    pub max_connections: u32,
}

impl DatabaseSettings {
    /// SQLite settings pointing at the given file.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            db_type: DbType::Sqlite,
            path: path.into(),
            host: defaults::DB_HOST.to_string(),
            port: defaults::DB_PORT,
            name: defaults::DB_NAME.to_string(),
            user: defaults::DB_USER.to_string(),
            password: SecretString::from(defaults::DB_PASSWORD),
            max_connections: defaults::DB_MAX_CONNECTIONS,
        }
    }

    /// Render the SeaORM connection URL.
    pub fn connection_url(&self) -> String {
        match self.db_type {
            DbType::Sqlite => format!("sqlite://{}?mode=rwc", self.path.display()),
            DbType::Mysql => format!(
                "mysql://{}:{}@{}:{}/{}",
                urlencoding::encode(&self.user),
                urlencoding::encode(self.password.expose_secret()),
                self.host,
                self.port,
                self.name
            ),
            DbType::Postgres => format!(
                "postgres://{}:{}@{}:{}/{}",
                urlencoding::encode(&self.user),
                urlencoding::encode(self.password.expose_secret()),
                self.host,
                self.port,
                self.name
            ),
        }
    }

    /// Connection URL that never creates or writes the SQLite file.
    pub fn read_only_url(&self) -> String {
        match self.db_type {
            DbType::Sqlite => format!("sqlite://{}?mode=ro", self.path.display()),
            _ => self.connection_url(),
        }
    }

    /// Location description safe to log or return to clients.
    pub fn redacted_location(&self) -> String {
        match self.db_type {
            DbType::Sqlite => self.path.display().to_string(),
            _ => format!("{}@{}:{}/{}", self.user, self.host, self.port, self.name),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Bind host for both listeners
    pub host: String,
    /// Query/management API port
    pub api_port: u16,
    /// Webhook listener port
    pub webhook_port: u16,
    /// Shared webhook secret; `None` disables signature verification
    pub webhook_secret: Option<SecretString>,
    /// Token for outbound GitHub API calls
    pub github_token: Option<SecretString>,
    /// Database connection settings
    pub database: DatabaseSettings,
    /// Open ngrok tunnels at startup
    pub enable_ngrok: bool,
    pub ngrok_auth_token: Option<SecretString>,
    /// JSON sidecar for auto-PR and post-merge configuration
    pub auto_pr_config_path: PathBuf,
    /// `.env` file edited by the settings service
    pub env_file: PathBuf,
    /// Built dashboard assets
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RUST_ENV`: development/production (default: development)
    /// - `HOST`: bind host (default: 0.0.0.0)
    /// - `API_PORT`: API port (default: 8001)
    /// - `WEBHOOK_PORT`: webhook port (default: 8002)
    /// - `GITHUB_WEBHOOK_SECRET`: HMAC secret (optional)
    /// - `GITHUB_TOKEN`: GitHub API token (optional)
    /// - `DB_TYPE`: SQLite, MySQL or PostgreSQL (default: SQLite)
    /// - `GITHUB_EVENTS_DB`: SQLite file (default: github_events.db)
    /// - `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER`, `DB_PASSWORD`
    /// - `DB_MAX_CONNECTIONS`: pool size (default: 10)
    /// - `ENABLE_NGROK`: open tunnels at startup (default: false)
    /// - `NGROK_AUTH_TOKEN`: ngrok agent token (optional)
    /// - `AUTO_PR_CONFIG`: sidecar path (default: auto_branch_pr_config.json)
    /// - `ENV_FILE`: settings file (default: .env)
    /// - `STATIC_DIR`: dashboard assets (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("RUST_ENV") {
            Ok(s) => Environment::parse(&s).ok_or(ConfigError::InvalidValue(
                "RUST_ENV must be 'development' or 'production'",
            ))?,
            Err(_) => Environment::Development,
        };

        let host = env::var("HOST").unwrap_or_else(|_| defaults::HOST.to_string());

        let api_port = parse_port("API_PORT", defaults::API_PORT)?;
        let webhook_port = parse_port("WEBHOOK_PORT", defaults::WEBHOOK_PORT)?;

        let db_type_str = env::var("DB_TYPE").unwrap_or_else(|_| defaults::DB_TYPE.to_string());
        let db_type = DbType::parse(&db_type_str).ok_or(ConfigError::InvalidValue(
            "DB_TYPE must be SQLite, MySQL or PostgreSQL",
        ))?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| defaults::DB_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS must be a valid number"))?;

        let database = DatabaseSettings {
            db_type,
            path: PathBuf::from(
                env::var("GITHUB_EVENTS_DB").unwrap_or_else(|_| defaults::SQLITE_PATH.to_string()),
            ),
            host: env::var("DB_HOST").unwrap_or_else(|_| defaults::DB_HOST.to_string()),
            port: parse_port("DB_PORT", defaults::DB_PORT)?,
            name: env::var("DB_NAME").unwrap_or_else(|_| defaults::DB_NAME.to_string()),
            user: env::var("DB_USER").unwrap_or_else(|_| defaults::DB_USER.to_string()),
            password: SecretString::from(
                env::var("DB_PASSWORD").unwrap_or_else(|_| defaults::DB_PASSWORD.to_string()),
            ),
            max_connections,
        };

        let enable_ngrok = match env::var("ENABLE_NGROK") {
            Ok(v) => parse_bool(&v)
                .ok_or(ConfigError::InvalidValue("ENABLE_NGROK must be true or false"))?,
            Err(_) => false,
        };

        Ok(Config {
            environment,
            host,
            api_port,
            webhook_port,
            webhook_secret: non_empty_secret("GITHUB_WEBHOOK_SECRET"),
            github_token: non_empty_secret("GITHUB_TOKEN"),
            database,
            enable_ngrok,
            ngrok_auth_token: non_empty_secret("NGROK_AUTH_TOKEN"),
            auto_pr_config_path: PathBuf::from(
                env::var("AUTO_PR_CONFIG").unwrap_or_else(|_| defaults::AUTO_PR_CONFIG.to_string()),
            ),
            env_file: PathBuf::from(
                env::var("ENV_FILE").unwrap_or_else(|_| defaults::ENV_FILE.to_string()),
            ),
            static_dir: env::var("STATIC_DIR").ok().map(PathBuf::from),
        })
    }

    /// Bind address of the query API listener.
    pub fn api_bind_address(&self) -> String {
        format!("{}:{}", self.host, self.api_port)
    }

    /// Bind address of the webhook listener.
    pub fn webhook_bind_address(&self) -> String {
        format!("{}:{}", self.host, self.webhook_port)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

/// Parse a loosely written boolean (`true`, `1`, `yes`, ...).
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_port(var: &'static str, default: u16) -> Result<u16, ConfigError> {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort(var)),
        Err(_) => Ok(default),
    }
}

fn non_empty_secret(var: &str) -> Option<SecretString> {
    env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("{0} must be a valid port number")]
    InvalidPort(&'static str),
}
