//! Database management and auto-PR configuration endpoints.

use serde_json::json;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_database_info_reports_connected() {
    let ctx = TestContext::new().await;
    let api = create_api_app(&ctx).await;

    let (status, body) = get_json(&api, "/api/database/info").await;
    assert_eq!(status, 200);
    assert_eq!(body["type"], "SQLite");
    assert_eq!(body["connected"], true);
}

#[actix_rt::test]
async fn test_create_sqlite_then_refuse_overwrite() {
    let ctx = TestContext::new().await;
    let api = create_api_app(&ctx).await;
    let db_path = ctx.dir.path().join("fresh.db");
    let uri = format!(
        "/api/database/create-sqlite?db_path={}",
        urlencoding::encode(&db_path.display().to_string())
    );

    let (status, body) = post_json(&api, &uri, &json!({})).await;
    assert_eq!(status, 200, "{:?}", body);
    assert_eq!(body["success"], true);
    assert!(db_path.exists());

    let (status, _) = post_json(&api, &uri, &json!({})).await;
    assert_eq!(status, 400);
}

#[actix_rt::test]
async fn test_update_config_writes_env_after_successful_test() {
    let ctx = TestContext::new().await;
    ctx.write_env("API_PORT=8001\n");
    let api = create_api_app(&ctx).await;
    let db_path = ctx.dir.path().join("switched.db");
    let request = json!({ "type": "sqlite", "path": db_path.display().to_string() });

    // Testing a path that does not exist yet leaves it untouched
    let (status, body) = post_json(&api, "/api/database/test-connection", &request).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], false, "{:?}", body);
    assert!(!db_path.exists());

    let uri = format!(
        "/api/database/create-sqlite?db_path={}",
        urlencoding::encode(&db_path.display().to_string())
    );
    let (status, body) = post_json(&api, &uri, &json!({})).await;
    assert_eq!(status, 200, "{:?}", body);

    let (status, body) = post_json(&api, "/api/database/test-connection", &request).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true, "{:?}", body);

    let (status, body) = post_json(&api, "/api/database/update-config", &request).await;
    assert_eq!(status, 200, "{:?}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["restart_required"], true);

    let content = std::fs::read_to_string(ctx.env_file()).unwrap();
    assert!(content.contains("DB_TYPE=SQLite"));
    assert!(content.contains("GITHUB_EVENTS_DB="));
    assert!(content.contains("API_PORT=8001"));
}

#[actix_rt::test]
async fn test_update_config_refuses_missing_sqlite_file() {
    let ctx = TestContext::new().await;
    ctx.write_env("API_PORT=8001\n");
    let api = create_api_app(&ctx).await;
    let db_path = ctx.dir.path().join("absent.db");

    let request = json!({ "type": "sqlite", "path": db_path.display().to_string() });
    let (status, _) = post_json(&api, "/api/database/update-config", &request).await;
    assert_eq!(status, 400);
    assert!(!db_path.exists());
    assert_eq!(std::fs::read_to_string(ctx.env_file()).unwrap(), "API_PORT=8001\n");
}

#[actix_rt::test]
async fn test_update_config_rejects_unknown_backend() {
    let ctx = TestContext::new().await;
    let api = create_api_app(&ctx).await;

    let (status, body) =
        post_json(&api, "/api/database/update-config", &json!({ "type": "oracle" })).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[actix_rt::test]
async fn test_auto_pr_config_merge() {
    let ctx = TestContext::new().await;
    let api = create_api_app(&ctx).await;

    let (status, body) = get_json(&api, "/api/auto-pr/config").await;
    assert_eq!(status, 200);
    assert_eq!(body["auto_pr_enabled"], false);
    assert_eq!(body["auto_pr_settings"]["base_branch"], "main");

    let (status, body) = post_json(
        &api,
        "/api/auto-pr/config",
        &json!({ "auto_pr_enabled": true, "auto_pr_settings": { "base_branch": "develop" } }),
    )
    .await;
    assert_eq!(status, 200, "{:?}", body);
    assert_eq!(body["auto_pr_enabled"], true);
    assert_eq!(body["auto_pr_settings"]["base_branch"], "develop");
    // Untouched keys of a merged section keep their values
    assert_eq!(
        body["auto_pr_settings"]["title_template"],
        "PR for branch: {branch_name}"
    );

    let saved = std::fs::read_to_string(ctx.store.path()).unwrap();
    assert!(saved.contains("develop"));
}

#[actix_rt::test]
async fn test_projects_and_scripts() {
    let ctx = TestContext::new().await;
    let api = create_api_app(&ctx).await;

    let (status, _) = post_json(&api, "/api/projects", &json!({ "id": "web", "name": "Web" })).await;
    assert_eq!(status, 201);
    let (status, _) = post_json(&api, "/api/projects", &json!({ "id": "web", "name": "Web" })).await;
    assert_eq!(status, 400);

    let (_, projects) = get_json(&api, "/api/projects").await;
    assert_eq!(projects.as_array().unwrap().len(), 1);

    let script_path = ctx.dir.path().join("deploy.sh");
    std::fs::write(&script_path, "#!/bin/sh\nexit 0\n").unwrap();
    let (status, body) = post_json(
        &api,
        "/api/scripts",
        &json!({
            "name": "web",
            "script_path": script_path.display().to_string(),
            "repo_patterns": ["Hello-World"]
        }),
    )
    .await;
    assert_eq!(status, 201, "{:?}", body);
    assert_eq!(body["enabled"], true);

    let (status, _) = post_json(
        &api,
        "/api/scripts",
        &json!({ "name": "ghost", "script_path": "/nonexistent/script.sh" }),
    )
    .await;
    assert_eq!(status, 400);

    let (_, scripts) = get_json(&api, "/api/scripts").await;
    assert_eq!(scripts.as_array().unwrap().len(), 1);

    let req = actix_web::test::TestRequest::delete()
        .uri("/api/scripts/web")
        .to_request();
    let resp = actix_web::test::call_service(&api, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let req = actix_web::test::TestRequest::delete()
        .uri("/api/scripts/web")
        .to_request();
    let resp = actix_web::test::call_service(&api, req).await;
    assert_eq!(resp.status().as_u16(), 404);
}
