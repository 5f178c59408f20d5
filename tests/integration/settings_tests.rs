//! `.env` backed settings and config endpoints.

use serde_json::json;

use super::test_helpers::*;

const ENV_FILE: &str = "# GitEvents\nGITHUB_TOKEN=ghp_abcdefgh1234\nAPI_PORT=8001\nDB_PASSWORD=hunter2\nNGROK_AUTH_TOKEN=\n";

#[actix_rt::test]
async fn test_get_settings_masks_secrets() {
    let ctx = TestContext::new().await;
    ctx.write_env(ENV_FILE);
    let api = create_api_app(&ctx).await;

    let (status, body) = get_json(&api, "/api/settings").await;
    assert_eq!(status, 200);
    assert_eq!(body["github_token"], "••••1234");
    assert_eq!(body["db_password"], "••••••");
    assert_eq!(body["ngrok_auth_token"], "");
    assert_eq!(body["api_port"], 8001);
}

#[actix_rt::test]
async fn test_update_settings_requires_env_file() {
    let ctx = TestContext::new().await;
    let api = create_api_app(&ctx).await;

    let (status, body) = post_json(&api, "/api/settings", &json!({ "apiPort": 9001 })).await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

#[actix_rt::test]
async fn test_update_settings_rewrites_file() {
    let ctx = TestContext::new().await;
    ctx.write_env(ENV_FILE);
    let api = create_api_app(&ctx).await;

    let (status, body) = post_json(
        &api,
        "/api/settings",
        &json!({ "apiPort": 9001, "enableNgrok": true, "customFlag": "on" }),
    )
    .await;
    assert_eq!(status, 200, "{:?}", body);

    let content = std::fs::read_to_string(ctx.env_file()).unwrap();
    assert!(content.starts_with("# GitEvents\n"));
    assert!(content.contains("API_PORT=9001"));
    assert!(!content.contains("API_PORT=8001"));
    assert!(content.contains("ENABLE_NGROK=true"));
    assert!(content.contains("CUSTOM_FLAG=on"));
    assert!(content.contains("DB_PASSWORD=hunter2"));
}

#[actix_rt::test]
async fn test_config_tokens_round_trip_through_env_file() {
    let ctx = TestContext::new().await;
    let api = create_api_app(&ctx).await;

    let (status, body) = post_json(
        &api,
        "/api/config",
        &json!({ "github_token": "ghp_new_token", "ngrok_token": "" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["restart_required"], true);
    assert!(ctx.env_file().exists());

    let (_, view) = get_json(&api, "/api/config").await;
    assert_eq!(view["github_token_set"], true);

    let (_, body) = post_json(&api, "/api/config", &json!({})).await;
    assert_eq!(body["restart_required"], false);
}

#[actix_rt::test]
async fn test_validate_tokens_reports_unconfigured() {
    let ctx = TestContext::new().await;
    ctx.write_env("GITHUB_TOKEN=\nNGROK_AUTH_TOKEN=\n");
    let api = create_api_app(&ctx).await;

    let (status, body) = get_json(&api, "/api/system/validate-tokens").await;
    assert_eq!(status, 200);
    assert_eq!(body["github_token"]["valid"], false);
    assert_eq!(body["github_token"]["message"], "Token not configured");
    assert_eq!(body["ngrok_token"]["message"], "Token not configured");
}

#[actix_rt::test]
async fn test_tunnels_empty_when_ngrok_disabled() {
    let ctx = TestContext::new().await;
    let api = create_api_app(&ctx).await;

    let (status, body) = get_json(&api, "/api/system/tunnels").await;
    assert_eq!(status, 200);
    assert!(body["webhook_url"].is_null());
    assert!(body["api_url"].is_null());
}
