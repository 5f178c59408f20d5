//! Post-merge script execution.

use std::path::Path;
use std::process::Stdio;

use serde_json::{Value, json};
use tokio::process::Command;
use tracing::{error, info};

use crate::error::AppResult;
use crate::models::OperationResult;
use crate::models::auto_pr::{PostMergeScript, PostMergeScripts};
use crate::models::github::PullRequestPayload;

use super::auto_pr::AutoPrStore;
use super::event_handler::EventHandler;

/// Run the first enabled script whose patterns match `repo_name`.
///
/// Only one script ever runs; its exit status decides the outcome.
pub async fn execute_post_merge_script(
    config: &PostMergeScripts,
    repo_name: &str,
    branch_name: &str,
    pr_number: u64,
) -> OperationResult {
    if !config.enabled {
        return OperationResult::failure("Post-merge scripts are disabled");
    }

    let Some(script) = config
        .scripts
        .iter()
        .find(|s| s.enabled && s.matches(repo_name))
    else {
        return OperationResult::failure("No matching post-merge scripts found");
    };

    let mut command = script_command(&script.script_path);
    command
        .env("GITHUB_REPOSITORY", repo_name)
        .env("GITHUB_BRANCH", branch_name)
        .env("GITHUB_PR_NUMBER", pr_number.to_string())
        .env("GITHUB_PROJECT", &script.project_name)
        .stdin(Stdio::null());

    run_script(script, command).await
}

/// Pick the interpreter from the file extension.
fn script_command(script_path: &str) -> Command {
    match Path::new(script_path).extension().and_then(|e| e.to_str()) {
        Some("py") => {
            let mut cmd = Command::new("python3");
            cmd.arg(script_path);
            cmd
        }
        Some("sh") => {
            let mut cmd = Command::new("sh");
            cmd.arg(script_path);
            cmd
        }
        _ => Command::new(script_path),
    }
}

async fn run_script(script: &PostMergeScript, mut command: Command) -> OperationResult {
    match command.output().await {
        Ok(output) if output.status.success() => {
            info!(
                "Successfully executed post-merge script: {}",
                script.project_name
            );
            OperationResult::success(format!(
                "Script executed successfully: {}",
                script.project_name
            ))
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(
                "Post-merge script {} failed ({}): {}",
                script.project_name,
                output.status,
                stderr.trim()
            );
            OperationResult::failure(format!("Script execution failed: {}", stderr.trim()))
        }
        Err(e) => {
            error!("Error executing post-merge script {}: {}", script.script_path, e);
            OperationResult::failure(format!("Error executing script: {}", e))
        }
    }
}

/// Run post-merge scripts when a pull request is closed as merged.
pub async fn register_post_merge_handler(handler: &EventHandler, store: AutoPrStore) {
    handler
        .register("pull_request:closed", move |payload: Value| {
            let store = store.clone();
            async move { on_pull_request_closed(&store, payload).await }
        })
        .await;
}

async fn on_pull_request_closed(store: &AutoPrStore, payload: Value) -> AppResult<Value> {
    let event: PullRequestPayload = serde_json::from_value(payload)?;
    if !event.pull_request.is_merged() {
        return Ok(json!({ "message": "Pull request closed without merge" }));
    }

    let branch = event.pull_request.head.git_ref.clone().unwrap_or_default();
    let config = store.snapshot().await;
    let result = execute_post_merge_script(
        &config.post_merge_scripts,
        &event.repository.full_name,
        &branch,
        event.pull_request.number as u64,
    )
    .await;

    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(name: &str, path: &Path, patterns: &[&str]) -> PostMergeScript {
        PostMergeScript {
            project_name: name.to_string(),
            script_path: path.to_string_lossy().into_owned(),
            repo_patterns: patterns.iter().map(|p| p.to_string()).collect(),
            enabled: true,
            added_at: None,
        }
    }

    #[tokio::test]
    async fn test_disabled_scripts() {
        let config = PostMergeScripts::default();
        let result = execute_post_merge_script(&config, "octo/demo", "main", 1).await;
        assert_eq!(result, OperationResult::failure("Post-merge scripts are disabled"));
    }

    #[tokio::test]
    async fn test_no_matching_script() {
        let dir = tempfile::tempdir().unwrap();
        let config = PostMergeScripts {
            enabled: true,
            scripts: vec![script("api", &dir.path().join("api.sh"), &["backend"])],
        };

        let result = execute_post_merge_script(&config, "octo/frontend", "main", 1).await;
        assert_eq!(
            result,
            OperationResult::failure("No matching post-merge scripts found")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_only_matching_script_runs_and_decides_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let other_marker = dir.path().join("other.ran");
        let matching_marker = dir.path().join("matching.ran");

        let other = dir.path().join("other.sh");
        std::fs::write(
            &other,
            format!("touch '{}'\nexit 0\n", other_marker.display()),
        )
        .unwrap();
        let matching = dir.path().join("matching.sh");
        std::fs::write(
            &matching,
            format!("touch '{}'\necho boom >&2\nexit 3\n", matching_marker.display()),
        )
        .unwrap();

        let config = PostMergeScripts {
            enabled: true,
            scripts: vec![
                script("backend", &other, &["backend"]),
                script("frontend", &matching, &["frontend"]),
            ],
        };

        let result = execute_post_merge_script(&config, "octo/frontend-app", "feature/x", 7).await;

        assert!(!result.success);
        assert!(result.message.contains("boom"));
        assert!(matching_marker.exists());
        assert!(!other_marker.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_script_receives_context_environment() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("env.txt");
        let path = dir.path().join("deploy.sh");
        std::fs::write(
            &path,
            format!(
                "echo \"$GITHUB_REPOSITORY $GITHUB_BRANCH $GITHUB_PR_NUMBER $GITHUB_PROJECT\" > '{}'\n",
                out.display()
            ),
        )
        .unwrap();

        let first_disabled = PostMergeScript {
            enabled: false,
            ..script("disabled", &path, &[])
        };
        let config = PostMergeScripts {
            enabled: true,
            scripts: vec![first_disabled, script("web", &path, &[])],
        };

        let result = execute_post_merge_script(&config, "octo/demo", "feature/x", 42).await;

        assert!(result.success, "{}", result.message);
        assert_eq!(result.message, "Script executed successfully: web");
        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written.trim(), "octo/demo feature/x 42 web");
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let config = PostMergeScripts {
            enabled: true,
            scripts: vec![script("ghost", Path::new("/nonexistent/ghost-binary"), &[])],
        };

        let result = execute_post_merge_script(&config, "octo/demo", "main", 1).await;
        assert!(!result.success);
        assert!(result.message.starts_with("Error executing script"));
    }
}
