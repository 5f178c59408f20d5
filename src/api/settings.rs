//! `.env` settings endpoints.

use actix_web::{HttpResponse, get, post, web};
use serde_json::{Map, Value};

use crate::error::AppResult;
use crate::models::settings::ConfigUpdateResponse;
use crate::models::{ConfigUpdate, ConfigView, OperationResult, Settings};
use crate::services::SettingsService;

/// Current settings with secrets masked.
#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "Settings",
    responses(
        (status = 200, description = "Settings", body = Settings)
    )
)]
#[get("/settings")]
pub async fn get_settings(settings: web::Data<SettingsService>) -> HttpResponse {
    HttpResponse::Ok().json(settings.get_settings().masked())
}

/// Update settings in the `.env` file.
///
/// Keys may be camelCase or snake_case. Takes effect on restart.
#[utoipa::path(
    post,
    path = "/api/settings",
    tag = "Settings",
    request_body(content = Object, description = "Setting name to value"),
    responses(
        (status = 200, description = "Settings written", body = OperationResult),
        (status = 400, description = "Settings file missing or unwritable", body = OperationResult)
    )
)]
#[post("/settings")]
pub async fn update_settings(
    settings: web::Data<SettingsService>,
    body: web::Json<Map<String, Value>>,
) -> HttpResponse {
    let result = settings.update_settings(&body);
    if result.success {
        HttpResponse::Ok().json(result)
    } else {
        HttpResponse::BadRequest().json(result)
    }
}

/// Ports, database path and which tokens are set.
#[utoipa::path(
    get,
    path = "/api/config",
    tag = "Settings",
    responses(
        (status = 200, description = "Configuration summary", body = ConfigView)
    )
)]
#[get("/config")]
pub async fn get_config(settings: web::Data<SettingsService>) -> HttpResponse {
    let current = settings.get_settings();
    HttpResponse::Ok().json(ConfigView {
        api_port: current.api_port,
        webhook_port: current.webhook_port,
        db_path: current.github_events_db,
        github_token_set: !current.github_token.is_empty(),
        ngrok_token_set: !current.ngrok_auth_token.is_empty(),
    })
}

/// Store GitHub and ngrok tokens, creating the `.env` file if needed.
#[utoipa::path(
    post,
    path = "/api/config",
    tag = "Settings",
    request_body = ConfigUpdate,
    responses(
        (status = 200, description = "Tokens stored", body = ConfigUpdateResponse)
    )
)]
#[post("/config")]
pub async fn update_config(
    settings: web::Data<SettingsService>,
    body: web::Json<ConfigUpdate>,
) -> AppResult<HttpResponse> {
    let update = body.into_inner();
    let pairs: Vec<(String, String)> = [
        ("GITHUB_TOKEN", update.github_token),
        ("NGROK_AUTH_TOKEN", update.ngrok_token),
    ]
    .into_iter()
    .filter_map(|(key, value)| {
        value
            .filter(|v| !v.trim().is_empty())
            .map(|v| (key.to_string(), v))
    })
    .collect();

    if pairs.is_empty() {
        return Ok(HttpResponse::Ok().json(ConfigUpdateResponse::new("No changes", false)));
    }

    settings.set_values(&pairs, true)?;
    tracing::info!("Stored {} token(s) in {}", pairs.len(), settings.env_file().display());

    Ok(HttpResponse::Ok().json(ConfigUpdateResponse::new("Configuration updated", true)))
}

/// Configure settings routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_settings)
        .service(update_settings)
        .service(get_config)
        .service(update_config);
}
