//! Automatic pull requests for newly pushed branches.
//!
//! Configuration lives in a JSON sidecar managed by [`AutoPrStore`]. The
//! [`BranchMonitor`] polls GitHub for branch lists and opens a PR for every
//! branch that appears between two polls.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::auto_pr::{AutoPrConfig, PostMergeScript, Project};

use super::github_api::{CreatedPull, GitHubApi, NewPull, RemoteRepository};

/// Delay between polls after a successful cycle.
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);
/// Delay after a failed cycle.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(120);

/// Shared, file-backed auto-PR configuration.
#[derive(Clone)]
pub struct AutoPrStore {
    path: PathBuf,
    config: Arc<RwLock<AutoPrConfig>>,
}

impl AutoPrStore {
    /// Load the sidecar, creating it with defaults when it does not exist.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = read_config(&path);
        Self {
            path,
            config: Arc::new(RwLock::new(config)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn snapshot(&self) -> AutoPrConfig {
        self.config.read().await.clone()
    }

    /// Merge a partial document into the configuration and save it.
    ///
    /// Top-level objects are merged key by key; other values replace the
    /// current ones. Unknown top-level keys are ignored.
    pub async fn update(&self, patch: Value) -> AppResult<AutoPrConfig> {
        let Value::Object(patch) = patch else {
            return Err(AppError::InvalidInput(
                "Configuration update must be a JSON object".to_string(),
            ));
        };

        let mut config = self.config.write().await;
        let mut current = serde_json::to_value(&*config)?;
        if let Value::Object(current) = &mut current {
            for (key, value) in patch {
                match (current.get_mut(&key), value) {
                    (Some(Value::Object(section)), Value::Object(fields)) => {
                        section.extend(fields);
                    }
                    (Some(slot), value) => *slot = value,
                    (None, _) => warn!("Ignoring unknown configuration key: {}", key),
                }
            }
        }

        let updated: AutoPrConfig = serde_json::from_value(current)?;
        self.save(&updated).await?;
        *config = updated.clone();
        Ok(updated)
    }

    /// Register a post-merge script. The script file must exist.
    pub async fn add_post_merge_script(
        &self,
        project_name: &str,
        script_path: &str,
        repo_patterns: Vec<String>,
    ) -> AppResult<PostMergeScript> {
        if !Path::new(script_path).exists() {
            return Err(AppError::InvalidInput(format!(
                "Script file not found: {}",
                script_path
            )));
        }

        let script = PostMergeScript {
            project_name: project_name.to_string(),
            script_path: script_path.to_string(),
            repo_patterns,
            enabled: true,
            added_at: Some(Utc::now()),
        };

        let mut config = self.config.write().await;
        let mut updated = config.clone();
        updated.post_merge_scripts.scripts.push(script.clone());
        self.save(&updated).await?;
        *config = updated;

        info!("Added post-merge script: {}", project_name);
        Ok(script)
    }

    /// Remove every script registered under `project_name`.
    pub async fn remove_post_merge_script(&self, project_name: &str) -> AppResult<()> {
        let mut config = self.config.write().await;
        let mut updated = config.clone();
        let before = updated.post_merge_scripts.scripts.len();
        updated
            .post_merge_scripts
            .scripts
            .retain(|s| s.project_name != project_name);

        if updated.post_merge_scripts.scripts.len() == before {
            return Err(AppError::NotFound(format!(
                "Post-merge script {}",
                project_name
            )));
        }

        self.save(&updated).await?;
        *config = updated;
        info!("Removed post-merge script: {}", project_name);
        Ok(())
    }

    pub async fn post_merge_scripts(&self) -> Vec<PostMergeScript> {
        self.config.read().await.post_merge_scripts.scripts.clone()
    }

    pub async fn add_project(&self, id: &str, name: &str) -> AppResult<Project> {
        let mut config = self.config.write().await;
        if config.projects.iter().any(|p| p.id == id) {
            return Err(AppError::InvalidInput(format!(
                "Project {} already exists",
                id
            )));
        }

        let project = Project {
            id: id.to_string(),
            name: name.to_string(),
            added_at: Some(Utc::now()),
        };
        let mut updated = config.clone();
        updated.projects.push(project.clone());
        self.save(&updated).await?;
        *config = updated;

        info!("Added project: {}", name);
        Ok(project)
    }

    pub async fn projects(&self) -> Vec<Project> {
        self.config.read().await.projects.clone()
    }

    async fn save(&self, config: &AutoPrConfig) -> AppResult<()> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| AppError::Internal(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(&self.path, json).await?;
        info!("Configuration saved to {}", self.path.display());
        Ok(())
    }
}

fn read_config(path: &Path) -> AutoPrConfig {
    if !path.exists() {
        let config = AutoPrConfig::default();
        match serde_json::to_string_pretty(&config) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    error!("Error writing default config to {}: {}", path.display(), e);
                }
            }
            Err(e) => error!("Error serializing default config: {}", e),
        }
        return config;
    }

    match std::fs::read_to_string(path)
        .map_err(AppError::from)
        .and_then(|raw| serde_json::from_str::<AutoPrConfig>(&raw).map_err(AppError::from))
    {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading config from {}: {}", path.display(), e);
            AutoPrConfig::default()
        }
    }
}

/// Open a PR for `branch_name` unless configuration or an existing PR says not to.
///
/// Errors are logged and reported as `None`.
pub async fn create_pull_request_for_branch(
    api: &dyn GitHubApi,
    config: &AutoPrConfig,
    repo: &RemoteRepository,
    branch_name: &str,
) -> Option<CreatedPull> {
    if !config.auto_pr_enabled {
        info!("Auto PR creation is disabled");
        return None;
    }

    let settings = &config.auto_pr_settings;
    if let Some(pattern) = settings.exclusion_for(branch_name) {
        info!(
            "Branch {} matches exclusion pattern {}, skipping PR creation",
            branch_name, pattern
        );
        return None;
    }

    if !settings.includes_repo(&repo.full_name) {
        info!(
            "Repository {} not in inclusion list, skipping PR creation",
            repo.full_name
        );
        return None;
    }

    let head = format!("{}:{}", repo.owner.login, branch_name);
    match api.has_open_pull_for_head(&repo.full_name, &head).await {
        Ok(true) => {
            info!(
                "PR already exists for branch {} in {}",
                branch_name, repo.full_name
            );
            return None;
        }
        Ok(false) => {}
        Err(e) => {
            error!("Error checking PRs for branch {}: {}", branch_name, e);
            return None;
        }
    }

    let pull = NewPull {
        title: settings.render_title(branch_name, &repo.name),
        body: settings.render_body(branch_name, &repo.name),
        head: branch_name.to_string(),
        base: settings.base_branch.clone(),
    };

    match api.create_pull(&repo.full_name, &pull).await {
        Ok(created) => {
            info!(
                "Created PR #{} for branch {} in {}",
                created.number, branch_name, repo.full_name
            );
            Some(created)
        }
        Err(e) => {
            error!("Error creating PR for branch {}: {}", branch_name, e);
            None
        }
    }
}

/// Polls repositories for new branches.
///
/// The last seen branch set per repository is kept in memory only. The first
/// poll of a repository records a baseline and never opens PRs.
pub struct BranchMonitor {
    api: Arc<dyn GitHubApi>,
    store: AutoPrStore,
    known_branches: HashMap<String, HashSet<String>>,
}

impl BranchMonitor {
    pub fn new(api: Arc<dyn GitHubApi>, store: AutoPrStore) -> Self {
        Self {
            api,
            store,
            known_branches: HashMap::new(),
        }
    }

    /// Run one poll cycle and return the PRs it opened.
    pub async fn poll_once(&mut self) -> AppResult<Vec<CreatedPull>> {
        let config = self.store.snapshot().await;
        let repos = self.repositories_to_check(&config).await?;
        let mut created = Vec::new();

        for repo in repos {
            let current = match self.api.list_branches(&repo.full_name).await {
                Ok(branches) => branches,
                Err(e) => {
                    error!("Error getting branches for {}: {}", repo.full_name, e);
                    continue;
                }
            };

            let Some(previous) = self.known_branches.get(&repo.full_name) else {
                info!(
                    "Tracking {} with {} existing branches",
                    repo.full_name,
                    current.len()
                );
                self.known_branches.insert(repo.full_name.clone(), current);
                continue;
            };

            let mut new_branches: Vec<&String> = current.difference(previous).collect();
            new_branches.sort();

            for branch in new_branches {
                info!("New branch detected: {} in {}", branch, repo.full_name);
                if config.auto_pr_enabled {
                    if let Some(pull) =
                        create_pull_request_for_branch(self.api.as_ref(), &config, &repo, branch)
                            .await
                    {
                        created.push(pull);
                    }
                }
            }

            self.known_branches.insert(repo.full_name.clone(), current);
        }

        Ok(created)
    }

    async fn repositories_to_check(&self, config: &AutoPrConfig) -> AppResult<Vec<RemoteRepository>> {
        let included = &config.auto_pr_settings.included_repos;
        if included.is_empty() {
            return self.api.authenticated_repos().await;
        }

        let mut repos = Vec::with_capacity(included.len());
        for full_name in included {
            match self.api.get_repo(full_name).await {
                Ok(repo) => repos.push(repo),
                Err(e) => error!("Error accessing repository {}: {}", full_name, e),
            }
        }
        Ok(repos)
    }

    /// Poll until `shutdown` flips to `true`.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Branch monitor started");
        loop {
            let delay = match self.poll_once().await {
                Ok(_) => POLL_INTERVAL,
                Err(e) => {
                    error!("Error in branch monitor loop: {}", e);
                    ERROR_BACKOFF
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Branch monitor stopped");
    }

    /// Spawn the monitor on the tokio runtime.
    pub fn start(self) -> MonitorHandle {
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(self.run(rx));
        MonitorHandle { shutdown: tx, task }
    }
}

/// Handle to a running [`BranchMonitor`].
pub struct MonitorHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!("Branch monitor task ended abnormally: {}", e);
        }
    }
}
