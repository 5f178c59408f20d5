//! Tunnel status and token validation.

use actix_web::{HttpResponse, get, web};

use crate::models::system::{TokenValidationResponse, TunnelStatus};
use crate::services::{SettingsService, TokenChecker, TunnelService};

#[utoipa::path(
    get,
    path = "/api/system/tunnels",
    tag = "System",
    responses(
        (status = 200, description = "Public tunnel URLs, null when not running", body = TunnelStatus)
    )
)]
#[get("/system/tunnels")]
pub async fn tunnels(tunnel: web::Data<TunnelService>) -> HttpResponse {
    HttpResponse::Ok().json(tunnel.status().await)
}

/// Check the GitHub and ngrok tokens currently stored in `.env`.
#[utoipa::path(
    get,
    path = "/api/system/validate-tokens",
    tag = "System",
    responses(
        (status = 200, description = "Validation result per token", body = TokenValidationResponse)
    )
)]
#[get("/system/validate-tokens")]
pub async fn validate_tokens(
    settings: web::Data<SettingsService>,
    checker: web::Data<TokenChecker>,
) -> HttpResponse {
    let current = settings.get_settings();
    let (github_token, ngrok_token) = futures_util::join!(
        checker.validate_github(Some(current.github_token.as_str())),
        checker.validate_ngrok(Some(current.ngrok_auth_token.as_str())),
    );
    HttpResponse::Ok().json(TokenValidationResponse {
        github_token,
        ngrok_token,
    })
}

/// Configure system routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(tunnels).service(validate_tokens);
}
