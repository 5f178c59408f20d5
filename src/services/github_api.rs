//! Outbound GitHub REST calls used by the branch monitor.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// HTTP connect timeout for GitHub API calls.
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// HTTP total timeout for GitHub API calls.
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_API_BASE: &str = "https://api.github.com";
const PER_PAGE: usize = 100;
const USER_AGENT: &str = "gitevents";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteOwner {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteRepository {
    pub name: String,
    pub full_name: String,
    pub owner: RemoteOwner,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPull {
    pub title: String,
    pub body: String,
    /// Branch name in the same repository
    pub head: String,
    pub base: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedPull {
    pub number: u64,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
struct RemoteBranch {
    name: String,
}

/// The subset of the GitHub API the branch monitor needs.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Repositories accessible to the token owner.
    async fn authenticated_repos(&self) -> AppResult<Vec<RemoteRepository>>;

    async fn get_repo(&self, full_name: &str) -> AppResult<RemoteRepository>;

    async fn list_branches(&self, full_name: &str) -> AppResult<HashSet<String>>;

    /// Whether an open PR exists for `head` (`owner:branch`).
    async fn has_open_pull_for_head(&self, full_name: &str, head: &str) -> AppResult<bool>;

    async fn create_pull(&self, full_name: &str, pull: &NewPull) -> AppResult<CreatedPull>;
}

/// `reqwest` implementation against api.github.com.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    token: SecretString,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: SecretString) -> AppResult<Self> {
        Self::with_base_url(token, DEFAULT_API_BASE)
    }

    /// Point the client at another API root (GitHub Enterprise).
    pub fn with_base_url(token: SecretString, base_url: &str) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header(
                "Authorization",
                format!("Bearer {}", self.token.expose_secret()),
            )
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        decode(response, path).await
    }

    /// Follow `page=` until a short page is returned.
    async fn get_paginated<T: DeserializeOwned>(&self, path: &str) -> AppResult<Vec<T>> {
        let separator = if path.contains('?') { '&' } else { '?' };
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let page_path = format!("{}{}per_page={}&page={}", path, separator, PER_PAGE, page);
            let batch: Vec<T> = self.get_json(&page_path).await?;
            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                return Ok(items);
            }
            page += 1;
        }
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response, path: &str) -> AppResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::ExternalService(format!(
            "GitHub API {} returned {}: {}",
            path, status, body
        )));
    }
    Ok(response.json::<T>().await?)
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn authenticated_repos(&self) -> AppResult<Vec<RemoteRepository>> {
        self.get_paginated("/user/repos").await
    }

    async fn get_repo(&self, full_name: &str) -> AppResult<RemoteRepository> {
        self.get_json(&format!("/repos/{}", full_name)).await
    }

    async fn list_branches(&self, full_name: &str) -> AppResult<HashSet<String>> {
        let branches: Vec<RemoteBranch> = self
            .get_paginated(&format!("/repos/{}/branches", full_name))
            .await?;
        Ok(branches.into_iter().map(|b| b.name).collect())
    }

    async fn has_open_pull_for_head(&self, full_name: &str, head: &str) -> AppResult<bool> {
        let pulls: Vec<IgnoredAny> = self
            .get_json(&format!(
                "/repos/{}/pulls?state=open&head={}&per_page=1",
                full_name,
                urlencoding::encode(head)
            ))
            .await?;
        Ok(!pulls.is_empty())
    }

    async fn create_pull(&self, full_name: &str, pull: &NewPull) -> AppResult<CreatedPull> {
        let path = format!("/repos/{}/pulls", full_name);
        let response = self
            .request(reqwest::Method::POST, &path)
            .json(pull)
            .send()
            .await?;
        decode(response, &path).await
    }
}
