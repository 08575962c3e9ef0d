//! Service configuration.
//!
//! Loaded from an optional TOML file (`repograph.toml` by default) and then
//! overridden by environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::changes::CollectorSettings;
use crate::error::{RepographError, RepographResult};

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "repograph.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub github: GitHubConfig,
    pub neo4j: GraphConfig,
    pub sync: SyncSettings,
    pub server: ServerConfig,
}

/// Source host access.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub token: Option<String>,
    /// Shared secret for push-event signatures.
    pub secret: Option<String>,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub api_url: String,
    pub graphql_url: String,
    pub request_timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            secret: None,
            owner: String::new(),
            repo: String::new(),
            branch: "main".to_string(),
            api_url: "https://api.github.com".to_string(),
            graphql_url: "https://api.github.com/graphql".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
            database: "neo4j".to_string(),
        }
    }
}

/// Pipeline behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Use the push event's file lists; when false every push re-reads the tree.
    pub enable_diff_analysis: bool,
    /// Snapshot every revision and allow rollback.
    pub enable_rollback: bool,
    pub max_history_versions: usize,
    /// Seconds between reconciliation passes, counted from process start.
    pub reconcile_interval_secs: u64,
    /// Revisions fetched per reconciliation pass.
    pub history_depth: usize,
    pub full_resync_max_files: usize,
    pub reconcile_max_files: usize,
    pub fetch_batch_size: usize,
    pub batch_pause_ms: u64,
    pub fetch_timeout_secs: u64,
    pub code_excerpt_limit: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enable_diff_analysis: true,
            enable_rollback: true,
            max_history_versions: 50,
            reconcile_interval_secs: 2 * 60 * 60,
            history_depth: 10,
            full_resync_max_files: 500,
            reconcile_max_files: 100,
            fetch_batch_size: 10,
            batch_pause_ms: 500,
            fetch_timeout_secs: 30,
            code_excerpt_limit: crate::extract::DEFAULT_EXCERPT_LIMIT,
        }
    }
}

impl SyncSettings {
    pub fn collector_settings(&self) -> CollectorSettings {
        CollectorSettings {
            batch_size: self.fetch_batch_size,
            batch_pause: Duration::from_millis(self.batch_pause_ms),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
        }
    }

    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }

    /// History depth, bounded by `max_history_versions`.
    pub fn effective_history_depth(&self) -> usize {
        self.history_depth.min(self.max_history_versions)
    }
}

/// HTTP listener.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl SyncConfig {
    /// Load from `path` (or `repograph.toml` if present), then apply the environment.
    pub fn load(path: Option<&Path>) -> RepographResult<Self> {
        let path: Option<PathBuf> = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
        };

        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(&p)?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> RepographResult<Self> {
        toml::from_str(raw).map_err(|e| RepographError::config(e.to_string()))
    }

    /// Override fields from environment-style lookups.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let gh = &mut self.github;
        if let Some(v) = lookup("GITHUB_TOKEN") {
            gh.token = Some(v);
        }
        if let Some(v) = lookup("GITHUB_SECRET") {
            gh.secret = Some(v);
        }
        if let Some(v) = lookup("OWNER") {
            gh.owner = v;
        }
        if let Some(v) = lookup("REPO") {
            gh.repo = v;
        }
        if let Some(v) = lookup("BRANCH") {
            gh.branch = v;
        }
        if let Some(v) = lookup("GITHUB_API_URL") {
            gh.api_url = v;
        }
        if let Some(v) = lookup("GRAPHQL_URL") {
            gh.graphql_url = v;
        }

        let neo = &mut self.neo4j;
        if let Some(v) = lookup("NEO4J_URI") {
            neo.uri = v;
        }
        if let Some(v) = lookup("NEO4J_USER") {
            neo.user = v;
        }
        if let Some(v) = lookup("NEO4J_PASSWORD") {
            neo.password = v;
        }

        let sync = &mut self.sync;
        if let Some(v) = lookup("ENABLE_DIFF_ANALYSIS").and_then(|v| parse_bool(&v)) {
            sync.enable_diff_analysis = v;
        }
        if let Some(v) = lookup("ENABLE_ROLLBACK").and_then(|v| parse_bool(&v)) {
            sync.enable_rollback = v;
        }
        if let Some(v) = lookup("MAX_HISTORY_VERSIONS").and_then(|v| v.parse().ok()) {
            sync.max_history_versions = v;
        }
        if let Some(v) = lookup("RECONCILE_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            sync.reconcile_interval_secs = v;
        }
        if let Some(v) = lookup("HISTORY_DEPTH").and_then(|v| v.parse().ok()) {
            sync.history_depth = v;
        }

        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("PORT").and_then(|v| v.parse().ok()) {
            self.server.port = v;
        }
    }

    /// Check settings every command depends on.
    pub fn validate(&self) -> RepographResult<()> {
        if self.github.owner.is_empty() || self.github.repo.is_empty() {
            return Err(RepographError::config("github.owner and github.repo must be set"));
        }
        if self.sync.fetch_batch_size == 0 {
            return Err(RepographError::config("sync.fetch_batch_size must be at least 1"));
        }
        if self.sync.reconcile_interval_secs == 0 {
            return Err(RepographError::config("sync.reconcile_interval_secs must be positive"));
        }
        Ok(())
    }

    /// The push-event secret; required to accept events.
    pub fn webhook_secret(&self) -> RepographResult<&str> {
        self.github
            .secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RepographError::config("github.secret (GITHUB_SECRET) must be set"))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
