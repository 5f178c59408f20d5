//! Reads and rewrites the `.env` settings file.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{error, info};

use crate::config::{defaults, parse_bool};
use crate::error::{AppError, AppResult};
use crate::models::{OperationResult, Settings};

/// Logical setting name to `.env` key.
const KEY_MAPPING: &[(&str, &str)] = &[
    ("github_token", "GITHUB_TOKEN"),
    ("github_events_db", "GITHUB_EVENTS_DB"),
    ("api_port", "API_PORT"),
    ("webhook_port", "WEBHOOK_PORT"),
    ("enable_ngrok", "ENABLE_NGROK"),
    ("ngrok_auth_token", "NGROK_AUTH_TOKEN"),
    ("open_browser", "OPEN_BROWSER"),
    ("db_type", "DB_TYPE"),
    ("db_host", "DB_HOST"),
    ("db_port", "DB_PORT"),
    ("db_name", "DB_NAME"),
    ("db_user", "DB_USER"),
    ("db_password", "DB_PASSWORD"),
];

#[derive(Debug, Clone)]
pub struct SettingsService {
    env_file: PathBuf,
}

impl SettingsService {
    pub fn new(env_file: impl Into<PathBuf>) -> Self {
        Self {
            env_file: env_file.into(),
        }
    }

    pub fn env_file(&self) -> &Path {
        &self.env_file
    }

    /// Current settings: file values first, then the process environment, then defaults.
    pub fn get_settings(&self) -> Settings {
        let file = self.read_file_values();
        let lookup = |key: &str| file.get(key).cloned().or_else(|| env::var(key).ok());
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let port = |key: &str, default: u16| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(default)
        };

        Settings {
            github_token: string("GITHUB_TOKEN", ""),
            github_events_db: string("GITHUB_EVENTS_DB", defaults::SQLITE_PATH),
            api_port: port("API_PORT", defaults::API_PORT),
            webhook_port: port("WEBHOOK_PORT", defaults::WEBHOOK_PORT),
            enable_ngrok: flag("ENABLE_NGROK", false),
            ngrok_auth_token: string("NGROK_AUTH_TOKEN", ""),
            open_browser: flag("OPEN_BROWSER", true),
            db_type: string("DB_TYPE", defaults::DB_TYPE),
            db_host: string("DB_HOST", defaults::DB_HOST),
            db_port: port("DB_PORT", defaults::DB_PORT),
            db_name: string("DB_NAME", defaults::DB_NAME),
            db_user: string("DB_USER", defaults::DB_USER),
            db_password: string("DB_PASSWORD", defaults::DB_PASSWORD),
        }
    }

    /// Apply updates keyed by logical name (`githubToken`, `db_port`, ...).
    ///
    /// The file must already exist. Null values are ignored.
    pub fn update_settings(&self, updates: &Map<String, Value>) -> OperationResult {
        if !self.env_file.exists() {
            return OperationResult::failure(
                "Environment file not found. Run gitevents-deploy to create it.",
            );
        }

        let pairs: Vec<(String, String)> = updates
            .iter()
            .filter_map(|(key, value)| {
                let env_key = to_env_key(key)?;
                let value = match value {
                    Value::Null => return None,
                    Value::Bool(b) => b.to_string(),
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some((env_key, value))
            })
            .collect();

        match self.set_values(&pairs, false) {
            Ok(()) => {
                info!("Updated {} setting(s) in {}", pairs.len(), self.env_file.display());
                OperationResult::success("Settings updated successfully")
            }
            Err(e) => {
                error!("Error updating settings: {}", e);
                OperationResult::failure(format!("Failed to update settings: {}", e))
            }
        }
    }

    /// Write raw `KEY=value` pairs, rewriting existing lines in place.
    ///
    /// Comments and unrelated lines are preserved; new keys are appended.
    /// Values containing a carriage return are rejected.
    pub fn set_values(&self, pairs: &[(String, String)], create: bool) -> AppResult<()> {
        if let Some((key, _)) = pairs.iter().find(|(_, v)| v.contains('\r')) {
            return Err(AppError::InvalidInput(format!(
                "Value for {} contains a carriage return",
                key
            )));
        }

        let content = match std::fs::read_to_string(&self.env_file) {
            Ok(content) => content,
            Err(e) if create && e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(AppError::from(e)),
        };

        let mut pending: Vec<&(String, String)> = pairs.iter().collect();
        let mut lines: Vec<String> = content
            .lines()
            .map(|line| {
                let Some(key) = line_key(line) else {
                    return line.to_string();
                };
                match pending.iter().position(|(k, _)| k == key) {
                    Some(idx) => {
                        let (k, v) = pending.remove(idx);
                        format_line(k, v)
                    }
                    None => line.to_string(),
                }
            })
            .collect();

        lines.extend(pending.into_iter().map(|(k, v)| format_line(k, v)));

        let mut output = lines.join("\n");
        output.push('\n');
        std::fs::write(&self.env_file, output)?;
        Ok(())
    }

    fn read_file_values(&self) -> HashMap<String, String> {
        let iter = match dotenvy::from_path_iter(&self.env_file) {
            Ok(iter) => iter,
            Err(_) => return HashMap::new(),
        };
        iter.filter_map(|item| match item {
            Ok(pair) => Some(pair),
            Err(e) => {
                error!("Skipping malformed line in {}: {}", self.env_file.display(), e);
                None
            }
        })
        .collect()
    }
}

/// Key of a `KEY=value` line; `None` for comments and blank lines.
fn line_key(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, _) = trimmed.split_once('=')?;
    Some(key.trim())
}

/// Render a line dotenv reads back verbatim.
///
/// Single quotes are literal, so they are preferred. Values holding a
/// single quote, a backslash or a newline fall back to double quotes
/// with escapes.
fn format_line(key: &str, value: &str) -> String {
    let needs_quotes = value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '#' | '"' | '\'' | '\\' | '$'));
    if !needs_quotes {
        return format!("{}={}", key, value);
    }
    if !value.contains(['\'', '\n', '\\']) {
        return format!("{}='{}'", key, value);
    }

    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '\\' | '"' | '$' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    format!("{}=\"{}\"", key, escaped)
}

/// Map a camelCase or snake_case setting name to its `.env` key.
pub fn to_env_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return None;
    }
    let snake = camel_to_snake(key);
    let mapped = KEY_MAPPING
        .iter()
        .find(|(name, _)| *name == snake)
        .map(|(_, env_key)| env_key.to_string());
    Some(mapped.unwrap_or_else(|| snake.to_uppercase()))
}

fn camel_to_snake(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev != '_' && (prev.is_lowercase() || prev.is_ascii_digit() || next_is_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}
