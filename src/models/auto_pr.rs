//! Auto-PR and post-merge configuration stored in the JSON sidecar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Whole sidecar document. Missing fields are filled from defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AutoPrConfig {
    pub auto_pr_enabled: bool,
    pub auto_pr_settings: AutoPrSettings,
    pub post_merge_scripts: PostMergeScripts,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AutoPrSettings {
    /// Supports `{branch_name}` and `{repo_name}` placeholders
    pub title_template: String,
    pub body_template: String,
    pub base_branch: String,
    pub auto_assign_creator: bool,
    /// Substrings; a branch containing any of them never gets a PR
    pub excluded_branches: Vec<String>,
    /// Repository full names; empty means all accessible repositories
    pub included_repos: Vec<String>,
}

impl Default for AutoPrSettings {
    fn default() -> Self {
        Self {
            title_template: "PR for branch: {branch_name}".to_string(),
            body_template: "Automatically created PR for branch `{branch_name}`.".to_string(),
            base_branch: "main".to_string(),
            auto_assign_creator: true,
            excluded_branches: ["main", "master", "dev", "develop", "release", "hotfix"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            included_repos: Vec::new(),
        }
    }
}

impl AutoPrSettings {
    /// First exclusion pattern contained in the branch name, if any.
    pub fn exclusion_for(&self, branch_name: &str) -> Option<&str> {
        self.excluded_branches
            .iter()
            .map(String::as_str)
            .find(|pattern| branch_name.contains(pattern))
    }

    pub fn includes_repo(&self, full_name: &str) -> bool {
        self.included_repos.is_empty() || self.included_repos.iter().any(|r| r == full_name)
    }

    pub fn render_title(&self, branch_name: &str, repo_name: &str) -> String {
        render_template(&self.title_template, branch_name, repo_name)
    }

    pub fn render_body(&self, branch_name: &str, repo_name: &str) -> String {
        render_template(&self.body_template, branch_name, repo_name)
    }
}

fn render_template(template: &str, branch_name: &str, repo_name: &str) -> String {
    template
        .replace("{branch_name}", branch_name)
        .replace("{repo_name}", repo_name)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PostMergeScripts {
    pub enabled: bool,
    pub scripts: Vec<PostMergeScript>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PostMergeScript {
    pub project_name: String,
    pub script_path: String,
    /// Substrings of the repository full name; empty matches every repository
    #[serde(default)]
    pub repo_patterns: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub added_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl PostMergeScript {
    pub fn matches(&self, repo_name: &str) -> bool {
        self.repo_patterns.is_empty() || self.repo_patterns.iter().any(|p| repo_name.contains(p))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub added_at: Option<DateTime<Utc>>,
}

/// Body of `POST /api/projects`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    pub id: String,
    pub name: String,
}

/// Body of `POST /api/scripts`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateScriptRequest {
    /// Project the script belongs to; also its removal key
    pub name: String,
    pub script_path: String,
    #[serde(default)]
    pub repo_patterns: Vec<String>,
}
