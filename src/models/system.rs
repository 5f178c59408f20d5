//! Tunnel and token validation responses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct TunnelStatus {
    pub webhook_url: Option<String>,
    pub api_url: Option<String>,
}

/// Validation outcome for one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TokenValidation {
    pub valid: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl TokenValidation {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
            username: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenValidationResponse {
    pub github_token: TokenValidation,
    pub ngrok_token: TokenValidation,
}

/// Tunnel entry reported by the local ngrok agent API.
#[derive(Debug, Clone, Deserialize)]
pub struct NgrokTunnel {
    pub public_url: String,
    #[serde(default)]
    pub proto: String,
    #[serde(default)]
    pub config: NgrokTunnelConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NgrokTunnelConfig {
    /// Local address, e.g. `http://localhost:8002`
    #[serde(default)]
    pub addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NgrokTunnelList {
    #[serde(default)]
    pub tunnels: Vec<NgrokTunnel>,
}
