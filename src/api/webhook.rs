//! GitHub webhook receiver.
//!
//! Mounted on the webhook listener, separate from the query API. The body is
//! read raw so the HMAC is computed over the exact bytes GitHub signed.

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_HEADER};
use crate::error::{AppError, AppResult};
use crate::services::{EventHandler, SignatureCheck, WebhookHeaders, WebhookSecret};

const HOOK_ID_HEADER: &str = "X-GitHub-Hook-ID";
const TARGET_ID_HEADER: &str = "X-GitHub-Hook-Installation-Target-ID";
const TARGET_TYPE_HEADER: &str = "X-GitHub-Hook-Installation-Target-Type";

fn header(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn delivery_headers(req: &HttpRequest) -> WebhookHeaders {
    WebhookHeaders {
        event: header(req, EVENT_HEADER),
        delivery: header(req, DELIVERY_HEADER),
        hook_id: header(req, HOOK_ID_HEADER),
        installation_target_id: header(req, TARGET_ID_HEADER),
        installation_target_type: header(req, TARGET_TYPE_HEADER),
    }
}

/// Receive a webhook delivery.
#[utoipa::path(
    post,
    path = "/webhook/github",
    tag = "Webhook",
    request_body(content = Object, description = "GitHub event payload"),
    params(
        ("X-Hub-Signature-256" = Option<String>, Header, description = "sha256=<hex> HMAC of the body"),
        ("X-GitHub-Event" = Option<String>, Header, description = "Event name")
    ),
    responses(
        (status = 200, description = "Delivery processed", body = Object),
        (status = 400, description = "Body is not JSON", body = crate::error::ErrorResponse),
        (status = 401, description = "Signature missing or invalid", body = crate::error::ErrorResponse)
    )
)]
#[post("/github")]
pub async fn receive_webhook(
    req: HttpRequest,
    body: web::Bytes,
    secret: web::Data<WebhookSecret>,
    handler: web::Data<EventHandler>,
) -> AppResult<HttpResponse> {
    let signature = header(&req, SIGNATURE_HEADER);
    match secret.verify(&body, signature.as_deref()) {
        SignatureCheck::Valid => {}
        SignatureCheck::Skipped => {
            warn!("GITHUB_WEBHOOK_SECRET not set, skipping signature verification");
        }
        SignatureCheck::Missing => {
            return Err(AppError::Unauthorized(
                "Missing X-Hub-Signature-256 header".to_string(),
            ));
        }
        SignatureCheck::Mismatch => {
            return Err(AppError::Unauthorized("Invalid signature".to_string()));
        }
    }

    let payload: Value = serde_json::from_slice(&body)?;
    let headers = delivery_headers(&req);

    info!(
        event = headers.event.as_deref().unwrap_or("-"),
        delivery = headers.delivery.as_deref().unwrap_or("-"),
        bytes = body.len(),
        "Received webhook"
    );

    let result = handler.handle(payload, Some(&headers)).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Webhook listener health.
#[utoipa::path(
    get,
    path = "/webhook/health",
    tag = "Webhook",
    responses(
        (status = 200, description = "Listener is up")
    )
)]
#[get("/health")]
pub async fn webhook_health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Configure webhook routes (mounted under `/webhook`).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(receive_webhook).service(webhook_health);
}
