//! Webhook listener: signatures, dispatch and storage.

use actix_web::test;
use chrono::Utc;
use futures_util::future::join_all;
use gitevents_lib::entity::{branch_event, repository};
use gitevents_lib::services::persister::EventPersister;
use gitevents_lib::services::signature::sign;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{Value, json};

use super::test_helpers::*;

#[actix_rt::test]
async fn test_signed_delivery_is_accepted_and_stored() {
    let ctx = TestContext::new().await;
    let webhook = create_webhook_app(&ctx, Some(TEST_SECRET)).await;
    let api = create_api_app(&ctx).await;

    let payload = pull_request_payload("opened", "Update the README", false);
    let (status, body) = deliver(&webhook, "pull_request", &payload, Some(TEST_SECRET)).await;
    assert_eq!(status, 200, "{:?}", body);
    assert_eq!(body["message"], "Event type not handled");

    let (status, events) = get_json(&api, "/api/events/pr").await;
    assert_eq!(status, 200);
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event_type"], "opened");
    assert_eq!(events[0]["pull_request"]["number"], 1347);
    assert_eq!(events[0]["repository"]["full_name"], "octocat/Hello-World");
    // Author comes from pull_request.user, not the sender
    assert_eq!(events[0]["user"]["login"], "hubot");
}

#[actix_rt::test]
async fn test_tampered_body_is_rejected() {
    let ctx = TestContext::new().await;
    let webhook = create_webhook_app(&ctx, Some(TEST_SECRET)).await;

    let original = serde_json::to_vec(&create_branch_payload("feature-x")).unwrap();
    let signature = sign(TEST_SECRET.as_bytes(), &original).unwrap();
    let tampered = serde_json::to_vec(&create_branch_payload("feature-y")).unwrap();

    let req = test::TestRequest::post()
        .uri("/webhook/github")
        .insert_header(("X-GitHub-Event", "create"))
        .insert_header(("X-Hub-Signature-256", signature))
        .set_payload(tampered)
        .to_request();
    let resp = test::call_service(&webhook, req).await;
    assert_eq!(resp.status().as_u16(), 401);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHORIZED");

    let api = create_api_app(&ctx).await;
    let (_, events) = get_json(&api, "/api/events/branch").await;
    assert!(events.as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_missing_signature_is_rejected_when_secret_set() {
    let ctx = TestContext::new().await;
    let webhook = create_webhook_app(&ctx, Some(TEST_SECRET)).await;

    let (status, body) = deliver(&webhook, "create", &create_branch_payload("x"), None).await;
    assert_eq!(status, 401);
    assert!(body["message"].as_str().unwrap().contains("X-Hub-Signature-256"));
}

#[actix_rt::test]
async fn test_unsigned_delivery_accepted_without_secret() {
    let ctx = TestContext::new().await;
    let webhook = create_webhook_app(&ctx, None).await;

    let (status, _) = deliver(&webhook, "create", &create_branch_payload("feature-x"), None).await;
    assert_eq!(status, 200);

    let api = create_api_app(&ctx).await;
    let (_, events) = get_json(&api, "/api/events/branch").await;
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event_type"], "create");
    assert_eq!(events[0]["ref"], "refs/heads/feature-x");
    assert_eq!(events[0]["payload"]["sender"], "octocat");
}

#[actix_rt::test]
async fn test_invalid_json_is_bad_request() {
    let ctx = TestContext::new().await;
    let webhook = create_webhook_app(&ctx, None).await;

    let req = test::TestRequest::post()
        .uri("/webhook/github")
        .insert_header(("X-GitHub-Event", "push"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&webhook, req).await;
    assert_eq!(resp.status().as_u16(), 400);
}

#[actix_rt::test]
async fn test_repeated_deliveries_upsert_entities() {
    let ctx = TestContext::new().await;
    let webhook = create_webhook_app(&ctx, None).await;
    let api = create_api_app(&ctx).await;

    let opened = pull_request_payload("opened", "First title", false);
    let edited = pull_request_payload("edited", "Second title", false);
    deliver(&webhook, "pull_request", &opened, None).await;
    deliver(&webhook, "pull_request", &opened, None).await;
    deliver(&webhook, "pull_request", &edited, None).await;

    let (_, repos) = get_json(&api, "/api/repos").await;
    let repos = repos.as_array().unwrap();
    assert_eq!(repos.len(), 1);
    let repo_id = repos[0]["id"].as_i64().unwrap();

    let (status, prs) = get_json(&api, &format!("/api/repos/{}/prs", repo_id)).await;
    assert_eq!(status, 200);
    let prs = prs.as_array().unwrap();
    assert_eq!(prs.len(), 1);
    assert_eq!(prs[0]["title"], "Second title");

    let pr_id = prs[0]["id"].as_i64().unwrap();
    let (_, history) = get_json(&api, &format!("/api/prs/{}/events", pr_id)).await;
    let types: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event_type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["opened", "opened", "edited"]);
}

#[actix_rt::test]
async fn test_merged_pull_request_runs_post_merge_dispatch() {
    let ctx = TestContext::new().await;
    let webhook = create_webhook_app(&ctx, None).await;

    let payload = pull_request_payload("closed", "Ship it", true);
    let (status, body) = deliver(&webhook, "pull_request", &payload, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Post-merge scripts are disabled");

    let payload = pull_request_payload("closed", "Abandoned", false);
    let (_, body) = deliver(&webhook, "pull_request", &payload, None).await;
    assert_eq!(body["message"], "Pull request closed without merge");
}

#[actix_rt::test]
async fn test_installation_callback_is_acknowledged() {
    let ctx = TestContext::new().await;
    let webhook = create_webhook_app(&ctx, None).await;

    let payload = json!({ "installation_id": 42, "code": "abc", "setup_action": "install" });
    let (status, body) = deliver(&webhook, "installation", &payload, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["details"]["installation_id"], 42);
    assert_eq!(body["details"]["code"], "abc");
}

#[actix_rt::test]
async fn test_webhook_health() {
    let ctx = TestContext::new().await;
    let webhook = create_webhook_app(&ctx, Some(TEST_SECRET)).await;

    let (status, body) = get_json(&webhook, "/webhook/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
}

#[actix_rt::test]
async fn test_concurrent_first_deliveries_are_all_stored() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_file_pool(&dir, 8).await;
    let persister = EventPersister::new(pool.clone());

    // Two deliveries per repository that has never been seen before
    let deliveries: Vec<Value> = (0..15)
        .flat_map(|i| {
            let mut payload = create_branch_payload(&format!("feature/{}", i));
            payload["repository"]["id"] = json!(5000 + i);
            payload["repository"]["name"] = json!(format!("repo-{}", i));
            payload["repository"]["full_name"] = json!(format!("octocat/repo-{}", i));
            [payload.clone(), payload]
        })
        .collect();

    let results = join_all(
        deliveries
            .iter()
            .map(|payload| persister.persist("create", payload, Utc::now())),
    )
    .await;
    for result in &results {
        assert!(result.is_ok(), "{:?}", result);
    }

    let db = pool.connection();
    assert_eq!(repository::Entity::find().count(db).await.unwrap(), 15);
    assert_eq!(branch_event::Entity::find().count(db).await.unwrap(), 30);
}
