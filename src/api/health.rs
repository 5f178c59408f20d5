//! Liveness and readiness probes for the query API.
//!
//! `gitevents-deploy` polls `/api/health` until the server is up.

use actix_web::{HttpResponse, get, web};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::db::DbPool;

#[derive(Serialize, ToSchema)]
pub struct Liveness {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

#[derive(Serialize, ToSchema)]
pub struct Readiness {
    ready: bool,
    /// `connected` or `unreachable`
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

/// The process is up; no dependencies are checked.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Process is running", body = Liveness)
    )
)]
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(Liveness {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Whether the event database answers `SELECT 1`.
#[utoipa::path(
    get,
    path = "/api/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Event database reachable", body = Readiness),
        (status = 503, description = "Event database unreachable", body = Readiness)
    )
)]
#[get("/ready")]
pub async fn ready(pool: web::Data<DbPool>) -> HttpResponse {
    match pool.ping().await {
        Ok(()) => HttpResponse::Ok().json(Readiness {
            ready: true,
            database: "connected",
            detail: None,
        }),
        Err(e) => {
            warn!("Readiness check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(Readiness {
                ready: false,
                database: "unreachable",
                detail: Some(e.to_string()),
            })
        }
    }
}

pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(ready);
}
