//! Shared helpers for the integration tests.

use std::path::PathBuf;

use actix_web::{App, dev::ServiceResponse, test, web};
use gitevents_lib::api;
use gitevents_lib::config::{Config, DatabaseSettings, Environment};
use gitevents_lib::db::DbPool;
use gitevents_lib::services::post_merge::register_post_merge_handler;
use gitevents_lib::services::signature::sign;
use gitevents_lib::services::{
    AutoPrStore, EventHandler, SettingsService, TokenChecker, TunnelService, WebhookSecret,
};
use sea_orm::{ConnectOptions, Database};
use secrecy::SecretString;
use serde_json::{Value, json};
use tempfile::TempDir;

pub const TEST_SECRET: &str = "It's a Secret to Everybody";

/// Fresh in-memory database with migrations applied.
pub async fn create_test_pool() -> DbPool {
    // One connection: each connection to :memory: is its own database
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let conn = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    let pool = DbPool::from_connection(conn);
    pool.run_migrations()
        .await
        .expect("Failed to run migrations");
    pool
}

/// File-backed SQLite pool with several connections, for concurrent writers.
pub async fn create_file_pool(dir: &TempDir, max_connections: u32) -> DbPool {
    let settings = DatabaseSettings {
        max_connections,
        ..DatabaseSettings::sqlite(dir.path().join("events.db"))
    };
    let pool = DbPool::new(&settings)
        .await
        .expect("Failed to open file database");
    pool.run_migrations()
        .await
        .expect("Failed to run migrations");
    pool
}

/// Database, handler and file-backed services shared by one test.
pub struct TestContext {
    pub pool: DbPool,
    pub handler: web::Data<EventHandler>,
    pub store: AutoPrStore,
    pub dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        let pool = create_test_pool().await;
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = AutoPrStore::load(dir.path().join("auto_branch_pr_config.json"));
        let handler = web::Data::new(EventHandler::new(pool.clone()));
        register_post_merge_handler(&handler, store.clone()).await;
        Self {
            pool,
            handler,
            store,
            dir,
        }
    }

    pub fn env_file(&self) -> PathBuf {
        self.dir.path().join(".env")
    }

    /// Write the `.env` file the settings service edits.
    pub fn write_env(&self, content: &str) {
        std::fs::write(self.env_file(), content).expect("Failed to write .env");
    }

    pub fn config(&self) -> Config {
        Config {
            environment: Environment::Development,
            host: "127.0.0.1".to_string(),
            api_port: 8001,
            webhook_port: 8002,
            webhook_secret: None,
            github_token: None,
            database: DatabaseSettings::sqlite(":memory:"),
            enable_ngrok: false,
            ngrok_auth_token: None,
            auto_pr_config_path: self.store.path().to_path_buf(),
            env_file: self.env_file(),
            static_dir: None,
        }
    }
}

/// Webhook listener app; `secret` of `None` disables verification.
pub async fn create_webhook_app(
    ctx: &TestContext,
    secret: Option<&str>,
) -> impl actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
{
    let secret = WebhookSecret::new(secret.map(SecretString::from));
    test::init_service(
        App::new()
            .app_data(web::Data::new(secret))
            .app_data(ctx.handler.clone())
            .configure(api::configure_webhook_routes),
    )
    .await
}

/// API listener app.
pub async fn create_api_app(
    ctx: &TestContext,
) -> impl actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .app_data(web::Data::new(ctx.pool.clone()))
            .app_data(web::Data::new(ctx.config()))
            .app_data(web::Data::new(SettingsService::new(ctx.env_file())))
            .app_data(web::Data::new(ctx.store.clone()))
            .app_data(web::Data::new(TokenChecker::new()))
            .app_data(web::Data::new(TunnelService::new(None)))
            .configure(api::configure_api_routes),
    )
    .await
}

/// POST a delivery to `/webhook/github`, signing it when `secret` is given.
pub async fn deliver<S>(
    app: &S,
    event: &str,
    payload: &Value,
    secret: Option<&str>,
) -> (u16, Value)
where
    S: actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let body = serde_json::to_vec(payload).unwrap();
    let mut req = test::TestRequest::post()
        .uri("/webhook/github")
        .insert_header(("Content-Type", "application/json"))
        .insert_header(("X-GitHub-Event", event))
        .insert_header(("X-GitHub-Delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958"));
    if let Some(secret) = secret {
        let signature = sign(secret.as_bytes(), &body).unwrap();
        req = req.insert_header(("X-Hub-Signature-256", signature));
    }

    let resp = test::call_service(app, req.set_payload(body).to_request()).await;
    let status = resp.status().as_u16();
    let bytes = test::read_body(resp).await;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// GET a JSON endpoint.
pub async fn get_json<S>(app: &S, uri: &str) -> (u16, Value)
where
    S: actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::get().uri(uri).to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let bytes = test::read_body(resp).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// POST a JSON body.
pub async fn post_json<S>(app: &S, uri: &str, body: &Value) -> (u16, Value)
where
    S: actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri(uri)
        .set_json(body)
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let bytes = test::read_body(resp).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

pub fn repository_json() -> Value {
    json!({
        "id": 1296269,
        "name": "Hello-World",
        "full_name": "octocat/Hello-World",
        "private": false
    })
}

pub fn sender_json() -> Value {
    json!({ "id": 1, "login": "octocat", "type": "User" })
}

/// `pull_request` delivery for PR #1347.
pub fn pull_request_payload(action: &str, title: &str, merged: bool) -> Value {
    json!({
        "action": action,
        "number": 1347,
        "pull_request": {
            "id": 1,
            "number": 1347,
            "title": title,
            "body": "Please pull these awesome changes",
            "state": if action == "closed" { "closed" } else { "open" },
            "created_at": "2024-01-01T10:00:00Z",
            "updated_at": "2024-01-02T10:00:00Z",
            "merged": merged,
            "merged_at": if merged { json!("2024-01-02T10:00:00Z") } else { Value::Null },
            "user": { "id": 2, "login": "hubot", "type": "User" },
            "head": { "ref": "new-topic", "sha": "6dcb09b5b57875f334f61aebed695e2e4193db5e" },
            "base": { "ref": "main", "sha": "9049f1265b7d61be4a8904a9a27120d2064dab3b" }
        },
        "repository": repository_json(),
        "sender": sender_json()
    })
}

pub fn push_payload(git_ref: &str, created: bool) -> Value {
    json!({
        "ref": git_ref,
        "before": "0000000000000000000000000000000000000000",
        "after": "6113728f27ae82c7b1a177c8d03f9e96e0adf246",
        "created": created,
        "deleted": false,
        "forced": false,
        "commits": [{
            "id": "6113728f27ae82c7b1a177c8d03f9e96e0adf246",
            "message": "Add readme",
            "timestamp": "2024-01-03T09:00:00Z",
            "author": { "name": "Mona", "email": "mona@example.com", "username": "octocat" },
            "added": ["README.md"],
            "removed": [],
            "modified": []
        }],
        "repository": repository_json(),
        "sender": sender_json()
    })
}

pub fn create_branch_payload(branch: &str) -> Value {
    json!({
        "ref": branch,
        "ref_type": "branch",
        "master_branch": "main",
        "repository": repository_json(),
        "sender": sender_json()
    })
}
