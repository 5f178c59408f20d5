//! Runtime settings exposed by the settings endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Settings read from the `.env` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Settings {
    pub github_token: String,
    pub github_events_db: String,
    pub api_port: u16,
    pub webhook_port: u16,
    pub enable_ngrok: bool,
    pub ngrok_auth_token: String,
    pub open_browser: bool,
    pub db_type: String,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
}

const TOKEN_MASK: &str = "••••";
const PASSWORD_MASK: &str = "••••••";

impl Settings {
    /// Copy safe to return to clients.
    pub fn masked(mut self) -> Self {
        self.github_token = mask_token(&self.github_token);
        self.ngrok_auth_token = mask_token(&self.ngrok_auth_token);
        if !self.db_password.is_empty() {
            self.db_password = PASSWORD_MASK.to_string();
        }
        self
    }
}

/// `••••` followed by the last four characters; empty stays empty.
pub fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = token.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}{}", TOKEN_MASK, tail)
}

/// Summary returned by `GET /api/config`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConfigView {
    pub api_port: u16,
    pub webhook_port: u16,
    pub db_path: String,
    pub github_token_set: bool,
    pub ngrok_token_set: bool,
}

/// Body of `POST /api/config`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ConfigUpdate {
    pub github_token: Option<String>,
    pub ngrok_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConfigUpdateResponse {
    pub success: bool,
    pub message: String,
    pub restart_required: bool,
}

impl ConfigUpdateResponse {
    pub fn new(message: impl Into<String>, restart_required: bool) -> Self {
        Self {
            success: true,
            message: message.into(),
            restart_required,
        }
    }
}
