//! Event feeds, limits and repository browsing.

use chrono::{TimeZone, Utc};
use gitevents_lib::db::{events, pull_requests, repositories, users};
use gitevents_lib::models::github::{GitHubAccount, GitHubPullRequest, GitHubRepository};

use super::test_helpers::*;

/// One PR event, one branch event and one push event on consecutive days.
async fn seed_three_days(ctx: &TestContext) {
    let db = ctx.pool.connection();
    let repo_data: GitHubRepository = serde_json::from_value(repository_json()).unwrap();
    let sender_data: GitHubAccount = serde_json::from_value(sender_json()).unwrap();
    let pr_data: GitHubPullRequest =
        serde_json::from_value(pull_request_payload("opened", "Seed", false)["pull_request"].clone())
            .unwrap();

    let repo = repositories::upsert(db, &repo_data).await.unwrap();
    let sender = users::upsert(db, &sender_data).await.unwrap();
    let pr = pull_requests::upsert(db, &pr_data, repo.id, sender.id)
        .await
        .unwrap();

    events::insert_pr_event(
        db,
        pr.id,
        "opened",
        None,
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
    )
    .await
    .unwrap();
    events::insert_branch_event(
        db,
        repo.id,
        "create",
        "refs/heads/feature-x",
        None,
        Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap(),
    )
    .await
    .unwrap();
    events::insert_push_event(
        db,
        repo.id,
        sender.id,
        events::NewPushEvent {
            git_ref: "refs/heads/feature-x",
            before: "a",
            after: "b",
            created: false,
            deleted: false,
            forced: false,
            commits: &[],
        },
        Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap(),
    )
    .await
    .unwrap();
}

#[actix_rt::test]
async fn test_combined_feed_is_newest_first() {
    let ctx = TestContext::new().await;
    seed_three_days(&ctx).await;
    let api = create_api_app(&ctx).await;

    let (status, feed) = get_json(&api, "/api/events/all").await;
    assert_eq!(status, 200);
    let categories: Vec<&str> = feed
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event_category"].as_str().unwrap())
        .collect();
    assert_eq!(categories, vec!["push", "branch", "pull_request"]);

    let (_, feed) = get_json(&api, "/api/events/all?limit=2").await;
    assert_eq!(feed.as_array().unwrap().len(), 2);
}

#[actix_rt::test]
async fn test_out_of_range_limits_are_rejected() {
    let ctx = TestContext::new().await;
    let api = create_api_app(&ctx).await;

    for uri in [
        "/api/events/pr?limit=0",
        "/api/events/branch?limit=101",
        "/api/events/push?limit=1000",
        "/api/events/all?limit=0",
        "/api/prs/1/events?limit=501",
    ] {
        let (status, body) = get_json(&api, uri).await;
        assert_eq!(status, 400, "{} -> {:?}", uri, body);
        assert_eq!(body["error"], "INVALID_INPUT");
    }

    let (status, _) = get_json(&api, "/api/prs/1/events?limit=500").await;
    assert_eq!(status, 200);
}

#[actix_rt::test]
async fn test_branch_push_records_commits_and_lifecycle() {
    let ctx = TestContext::new().await;
    let webhook = create_webhook_app(&ctx, None).await;
    let api = create_api_app(&ctx).await;

    deliver(&webhook, "push", &push_payload("refs/heads/feature-x", true), None).await;
    deliver(&webhook, "push", &push_payload("refs/tags/v1.0", true), None).await;

    let (_, pushes) = get_json(&api, "/api/events/push").await;
    let pushes = pushes.as_array().unwrap();
    assert_eq!(pushes.len(), 1, "tag pushes are not stored");
    assert_eq!(pushes[0]["ref"], "refs/heads/feature-x");
    assert_eq!(pushes[0]["commits"][0]["message"], "Add readme");
    assert_eq!(pushes[0]["commits"][0]["author"]["username"], "octocat");

    let (_, branches) = get_json(&api, "/api/events/branch").await;
    let branches = branches.as_array().unwrap();
    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0]["event_type"], "created");
}

#[actix_rt::test]
async fn test_unknown_repository_prs_not_found() {
    let ctx = TestContext::new().await;
    let api = create_api_app(&ctx).await;

    let (status, body) = get_json(&api, "/api/repos/999/prs").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[actix_rt::test]
async fn test_health_and_ready() {
    let ctx = TestContext::new().await;
    let api = create_api_app(&ctx).await;

    let (status, body) = get_json(&api, "/api/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "gitevents");

    let (status, body) = get_json(&api, "/api/ready").await;
    assert_eq!(status, 200);
    assert_eq!(body["ready"], true);
    assert_eq!(body["database"], "connected");
    assert!(body.get("detail").is_none());
}
