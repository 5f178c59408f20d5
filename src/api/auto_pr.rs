//! Auto-PR, project and post-merge script endpoints.

use actix_web::{HttpResponse, delete, get, post, web};
use serde_json::Value;

use crate::error::AppResult;
use crate::models::auto_pr::{CreateProjectRequest, CreateScriptRequest};
use crate::models::{AutoPrConfig, OperationResult, PostMergeScript, Project};
use crate::services::AutoPrStore;

/// Current auto-PR configuration.
#[utoipa::path(
    get,
    path = "/api/auto-pr/config",
    tag = "Auto PR",
    responses(
        (status = 200, description = "Configuration", body = AutoPrConfig)
    )
)]
#[get("/auto-pr/config")]
pub async fn get_auto_pr_config(store: web::Data<AutoPrStore>) -> HttpResponse {
    HttpResponse::Ok().json(store.snapshot().await)
}

/// Merge a partial configuration document and save it.
#[utoipa::path(
    post,
    path = "/api/auto-pr/config",
    tag = "Auto PR",
    request_body(content = Object, description = "Partial AutoPrConfig"),
    responses(
        (status = 200, description = "Updated configuration", body = AutoPrConfig),
        (status = 400, description = "Body is not an object or has invalid fields", body = crate::error::ErrorResponse)
    )
)]
#[post("/auto-pr/config")]
pub async fn update_auto_pr_config(
    store: web::Data<AutoPrStore>,
    body: web::Json<Value>,
) -> AppResult<HttpResponse> {
    let updated = store.update(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "Auto PR",
    responses(
        (status = 200, description = "Projects", body = Vec<Project>)
    )
)]
#[get("/projects")]
pub async fn list_projects(store: web::Data<AutoPrStore>) -> HttpResponse {
    HttpResponse::Ok().json(store.projects().await)
}

#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "Auto PR",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project added", body = Project),
        (status = 400, description = "Duplicate id", body = crate::error::ErrorResponse)
    )
)]
#[post("/projects")]
pub async fn add_project(
    store: web::Data<AutoPrStore>,
    body: web::Json<CreateProjectRequest>,
) -> AppResult<HttpResponse> {
    let project = store.add_project(&body.id, &body.name).await?;
    Ok(HttpResponse::Created().json(project))
}

#[utoipa::path(
    get,
    path = "/api/scripts",
    tag = "Auto PR",
    responses(
        (status = 200, description = "Post-merge scripts", body = Vec<PostMergeScript>)
    )
)]
#[get("/scripts")]
pub async fn list_scripts(store: web::Data<AutoPrStore>) -> HttpResponse {
    HttpResponse::Ok().json(store.post_merge_scripts().await)
}

/// Register a post-merge script; the file must exist on this host.
#[utoipa::path(
    post,
    path = "/api/scripts",
    tag = "Auto PR",
    request_body = CreateScriptRequest,
    responses(
        (status = 201, description = "Script registered", body = PostMergeScript),
        (status = 400, description = "Script file not found", body = crate::error::ErrorResponse)
    )
)]
#[post("/scripts")]
pub async fn add_script(
    store: web::Data<AutoPrStore>,
    body: web::Json<CreateScriptRequest>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    let script = store
        .add_post_merge_script(&request.name, &request.script_path, request.repo_patterns)
        .await?;
    Ok(HttpResponse::Created().json(script))
}

#[utoipa::path(
    delete,
    path = "/api/scripts/{project_name}",
    tag = "Auto PR",
    params(("project_name" = String, Path, description = "Project the script was registered under")),
    responses(
        (status = 200, description = "Script removed", body = OperationResult),
        (status = 404, description = "No script for this project", body = crate::error::ErrorResponse)
    )
)]
#[delete("/scripts/{project_name}")]
pub async fn remove_script(
    store: web::Data<AutoPrStore>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let project_name = path.into_inner();
    store.remove_post_merge_script(&project_name).await?;
    Ok(HttpResponse::Ok().json(OperationResult::success(format!(
        "Removed post-merge script for {}",
        project_name
    ))))
}

/// Configure auto-PR routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_auto_pr_config)
        .service(update_auto_pr_config)
        .service(list_projects)
        .service(add_project)
        .service(list_scripts)
        .service(add_script)
        .service(remove_script);
}
