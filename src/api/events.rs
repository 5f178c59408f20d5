//! Event feed handlers.

use actix_web::{HttpResponse, get, web};

use crate::db::{DbPool, events};
use crate::error::AppResult;
use crate::models::events::{
    BranchEventResponse, CombinedEvent, LimitParams, PrEventResponse, PushEventResponse,
    combine_events,
};

const DEFAULT_LIMIT: u64 = 10;
const DEFAULT_COMBINED_LIMIT: u64 = 30;
const MAX_LIMIT: u64 = 100;

/// Most recent pull request events.
#[utoipa::path(
    get,
    path = "/api/events/pr",
    tag = "Events",
    params(LimitParams),
    responses(
        (status = 200, description = "PR events, newest first", body = Vec<PrEventResponse>),
        (status = 400, description = "Limit out of range", body = crate::error::ErrorResponse)
    )
)]
#[get("/events/pr")]
pub async fn pr_events(
    pool: web::Data<DbPool>,
    query: web::Query<LimitParams>,
) -> AppResult<HttpResponse> {
    let limit = query.resolve(DEFAULT_LIMIT, MAX_LIMIT)?;
    let rows = events::recent_pr_events(pool.connection(), limit).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Most recent branch create/delete events.
#[utoipa::path(
    get,
    path = "/api/events/branch",
    tag = "Events",
    params(LimitParams),
    responses(
        (status = 200, description = "Branch events, newest first", body = Vec<BranchEventResponse>),
        (status = 400, description = "Limit out of range", body = crate::error::ErrorResponse)
    )
)]
#[get("/events/branch")]
pub async fn branch_events(
    pool: web::Data<DbPool>,
    query: web::Query<LimitParams>,
) -> AppResult<HttpResponse> {
    let limit = query.resolve(DEFAULT_LIMIT, MAX_LIMIT)?;
    let rows = events::recent_branch_events(pool.connection(), limit).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Most recent pushes.
#[utoipa::path(
    get,
    path = "/api/events/push",
    tag = "Events",
    params(LimitParams),
    responses(
        (status = 200, description = "Push events, newest first", body = Vec<PushEventResponse>),
        (status = 400, description = "Limit out of range", body = crate::error::ErrorResponse)
    )
)]
#[get("/events/push")]
pub async fn push_events(
    pool: web::Data<DbPool>,
    query: web::Query<LimitParams>,
) -> AppResult<HttpResponse> {
    let limit = query.resolve(DEFAULT_LIMIT, MAX_LIMIT)?;
    let rows = events::recent_push_events(pool.connection(), limit).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// All three feeds merged, newest first.
///
/// Each category is fetched with the same limit, so the merged page is
/// exact: no event older than the cut can displace a newer one.
#[utoipa::path(
    get,
    path = "/api/events/all",
    tag = "Events",
    params(LimitParams),
    responses(
        (status = 200, description = "Combined feed tagged with event_category", body = Vec<CombinedEvent>),
        (status = 400, description = "Limit out of range", body = crate::error::ErrorResponse)
    )
)]
#[get("/events/all")]
pub async fn all_events(
    pool: web::Data<DbPool>,
    query: web::Query<LimitParams>,
) -> AppResult<HttpResponse> {
    let limit = query.resolve(DEFAULT_COMBINED_LIMIT, MAX_LIMIT)?;
    let db = pool.connection();

    let (pr, branch, push) = futures_util::try_join!(
        events::recent_pr_events(db, limit),
        events::recent_branch_events(db, limit),
        events::recent_push_events(db, limit),
    )?;

    Ok(HttpResponse::Ok().json(combine_events(pr, branch, push, limit as usize)))
}

/// Configure event routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(pr_events)
        .service(branch_events)
        .service(push_events)
        .service(all_events);
}
