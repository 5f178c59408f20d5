//! Validation of the configured GitHub and ngrok tokens.

use std::time::Duration;

use crate::models::system::TokenValidation;

const GITHUB_USER_URL: &str = "https://api.github.com/user";
const NGROK_TUNNELS_URL: &str = "https://api.ngrok.com/tunnels";
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(serde::Deserialize)]
struct GitHubUser {
    login: String,
}

pub struct TokenChecker {
    http: reqwest::Client,
}

impl TokenChecker {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(HTTP_REQUEST_TIMEOUT)
                .user_agent("gitevents")
                .build()
                .unwrap_or_default(),
        }
    }

    /// `GET /user` with the token.
    pub async fn validate_github(&self, token: Option<&str>) -> TokenValidation {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return TokenValidation::invalid("Token not configured");
        };

        let response = match self
            .http
            .get(GITHUB_USER_URL)
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return TokenValidation::invalid(format!("Error validating token: {}", e)),
        };

        let status = response.status();
        if !status.is_success() {
            return TokenValidation::invalid(format!("Invalid token: {}", status));
        }

        match response.json::<GitHubUser>().await {
            Ok(user) => TokenValidation {
                valid: true,
                message: format!("Authenticated as {}", user.login),
                username: Some(user.login),
            },
            Err(e) => TokenValidation::invalid(format!("Error validating token: {}", e)),
        }
    }

    /// List tunnels through the ngrok cloud API.
    pub async fn validate_ngrok(&self, token: Option<&str>) -> TokenValidation {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return TokenValidation::invalid("Token not configured");
        };

        match self
            .http
            .get(NGROK_TUNNELS_URL)
            .header("Authorization", format!("Bearer {}", token))
            .header("Ngrok-Version", "2")
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => TokenValidation {
                valid: true,
                message: "Valid Ngrok token".to_string(),
                username: None,
            },
            Ok(response) => TokenValidation::invalid(format!("Invalid token: {}", response.status())),
            Err(e) => TokenValidation::invalid(format!("Error validating token: {}", e)),
        }
    }
}

impl Default for TokenChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_tokens_are_invalid_without_network() {
        let checker = TokenChecker::new();

        let github = checker.validate_github(None).await;
        assert!(!github.valid);
        assert_eq!(github.message, "Token not configured");

        let ngrok = checker.validate_ngrok(Some("")).await;
        assert!(!ngrok.valid);
    }
}
