//! Repository and pull request browsing.

use actix_web::{HttpResponse, get, web};

use crate::db::{DbPool, events, pull_requests, repositories};
use crate::error::{AppError, AppResult};
use crate::models::events::{LimitParams, PrHistoryEvent};
use crate::models::{PullRequestResponse, RepositoryResponse};

/// List every tracked repository.
#[utoipa::path(
    get,
    path = "/api/repos",
    tag = "Repositories",
    responses(
        (status = 200, description = "Repositories", body = Vec<RepositoryResponse>)
    )
)]
#[get("/repos")]
pub async fn list_repos(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let repos: Vec<RepositoryResponse> = repositories::list_all(pool.connection())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(HttpResponse::Ok().json(repos))
}

/// Pull requests of one repository, most recently updated first.
#[utoipa::path(
    get,
    path = "/api/repos/{repo_id}/prs",
    tag = "Repositories",
    params(
        ("repo_id" = i32, Path, description = "Repository row id"),
        LimitParams
    ),
    responses(
        (status = 200, description = "Pull requests", body = Vec<PullRequestResponse>),
        (status = 400, description = "Limit out of range", body = crate::error::ErrorResponse),
        (status = 404, description = "Repository not found", body = crate::error::ErrorResponse)
    )
)]
#[get("/repos/{repo_id}/prs")]
pub async fn list_repo_prs(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    query: web::Query<LimitParams>,
) -> AppResult<HttpResponse> {
    let repo_id = path.into_inner();
    let limit = query.resolve(10, 100)?;
    let db = pool.connection();

    if repositories::find_by_id(db, repo_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Repository {}", repo_id)));
    }

    let prs: Vec<PullRequestResponse> = pull_requests::list_for_repository(db, repo_id, limit)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(HttpResponse::Ok().json(prs))
}

/// Event history of a pull request, oldest first.
#[utoipa::path(
    get,
    path = "/api/prs/{pr_id}/events",
    tag = "Repositories",
    params(
        ("pr_id" = i32, Path, description = "Pull request row id"),
        LimitParams
    ),
    responses(
        (status = 200, description = "PR events", body = Vec<PrHistoryEvent>),
        (status = 400, description = "Limit out of range", body = crate::error::ErrorResponse)
    )
)]
#[get("/prs/{pr_id}/events")]
pub async fn pr_history(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    query: web::Query<LimitParams>,
) -> AppResult<HttpResponse> {
    let limit = query.resolve(100, 500)?;
    let history = events::pr_event_history(pool.connection(), path.into_inner(), limit).await?;
    Ok(HttpResponse::Ok().json(history))
}

/// Configure repository routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_repos)
        .service(list_repo_prs)
        .service(pr_history);
}
