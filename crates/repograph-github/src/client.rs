//! GitHub HTTP client.
//!
//! REST calls for contents and trees, a GraphQL call for branch history.
//! Rate-limited responses (403/429) are retried with exponential backoff,
//! honoring `retry-after` when GitHub sends it.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use repograph_core::config::GitHubConfig;
use repograph_core::source::{FileContent, SourceHost, TreeEntry};
use repograph_core::RevisionInfo;

use crate::api::{
    history_from_response, ContentResponse, GraphQlRequest, GraphQlResponse, HistoryData, HistoryVariables,
    TreeItem, TreeResponse, HISTORY_QUERY, MAX_HISTORY_PAGE,
};

pub const DEFAULT_USER_AGENT: &str = concat!("repograph/", env!("CARGO_PKG_VERSION"));

const MAX_RETRIES: u32 = 3;

/// GitHub client for one repository and branch.
#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: Url,
    graphql_url: String,
    owner: String,
    repo: String,
    branch: String,
    token: Option<String>,
    initial_backoff: Duration,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        let api_url = Url::parse(&config.api_url)
            .with_context(|| format!("Invalid GitHub API URL '{}'", config.api_url))?;
        if api_url.cannot_be_a_base() {
            bail!("GitHub API URL '{}' cannot be a base", config.api_url);
        }

        Ok(Self {
            client,
            api_url,
            graphql_url: config.graphql_url.clone(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            token: config.token.clone().filter(|t| !t.is_empty()),
            initial_backoff: Duration::from_secs(1),
        })
    }

    /// Override the first retry delay.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// `{api}/repos/{owner}/{repo}/{segments..}`, each segment percent-encoded.
    fn repo_url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("GitHub API URL cannot be a base"))?
            .pop_if_empty()
            .extend(["repos", self.owner.as_str(), self.repo.as_str()])
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.header("Authorization", format!("Bearer {token}")),
            None => req,
        }
    }

    /// Send a request, retrying rate-limited responses.
    async fn send<F>(&self, what: &str, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut delay = self.initial_backoff;

        for attempt in 0..=MAX_RETRIES {
            debug!(request = what, attempt, "GitHub API request");

            let resp = self
                .authorize(build())
                .send()
                .await
                .with_context(|| format!("GitHub API: {what}"))?;

            if resp.status().is_success() {
                return Ok(resp);
            }

            let status = resp.status();
            if (status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS) && attempt < MAX_RETRIES {
                let wait = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map_or(delay, Duration::from_secs);
                warn!(
                    attempt,
                    status = status.as_u16(),
                    wait_secs = wait.as_secs(),
                    "Rate limited, backing off"
                );
                tokio::time::sleep(wait).await;
                delay = (delay * 2).min(Duration::from_secs(60));
                continue;
            }

            let body = resp.text().await.unwrap_or_default();
            bail!("GitHub API {} for {}: {}", status.as_u16(), what, body);
        }

        bail!("GitHub API: max retries exceeded for {what}")
    }

    async fn get_json<T: DeserializeOwned>(&self, what: &str, url: Url) -> Result<T> {
        let resp = self
            .send(what, || {
                self.client
                    .get(url.clone())
                    .header("Accept", "application/vnd.github+json")
            })
            .await?;

        resp.json()
            .await
            .with_context(|| format!("Failed to parse GitHub response for {what}"))
    }
}

#[async_trait]
impl SourceHost for GitHubClient {
    async fn fetch_file(&self, path: &str, revision: &str) -> Result<FileContent> {
        let mut url = self.repo_url(std::iter::once("contents").chain(path.split('/')))?;
        url.query_pairs_mut().append_pair("ref", revision);

        let content: ContentResponse = self.get_json(&format!("contents of '{path}'"), url).await?;
        content.into_file()
    }

    async fn list_tree(&self, revision: &str) -> Result<Vec<TreeEntry>> {
        let mut url = self.repo_url(["git", "trees", revision])?;
        url.query_pairs_mut().append_pair("recursive", "1");

        let tree: TreeResponse = self.get_json(&format!("tree at {revision}"), url).await?;
        if tree.truncated {
            warn!(revision, entries = tree.tree.len(), "Tree listing truncated by GitHub");
        }

        Ok(tree.tree.into_iter().filter_map(TreeItem::into_entry).collect())
    }

    async fn recent_history(&self, limit: usize) -> Result<Vec<RevisionInfo>> {
        let body = GraphQlRequest {
            query: HISTORY_QUERY,
            variables: HistoryVariables {
                owner: &self.owner,
                name: &self.repo,
                qualified_name: format!("refs/heads/{}", self.branch),
                first: limit.clamp(1, MAX_HISTORY_PAGE),
            },
        };

        let resp = self
            .send("branch history", || self.client.post(&self.graphql_url).json(&body))
            .await?;
        let response: GraphQlResponse<HistoryData> = resp
            .json()
            .await
            .context("Failed to parse GraphQL history response")?;

        let history = history_from_response(response)?;
        debug!(branch = %self.branch, revisions = history.len(), "Fetched branch history");
        Ok(history)
    }
}
