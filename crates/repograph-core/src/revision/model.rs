//! Revision and push-event models.

use serde::{Deserialize, Serialize};

/// Metadata of one revision of the tracked branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionInfo {
    pub revision: String,
    pub message: String,
    pub author: String,
    pub timestamp: String,
}

impl RevisionInfo {
    pub fn new(revision: impl Into<String>) -> Self {
        Self {
            revision: revision.into(),
            ..Default::default()
        }
    }
}

/// Commit author as carried in push payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// One commit bundled in a push event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushCommit {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub author: CommitAuthor,
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub modified: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
}

/// Inbound push-event payload.
///
/// Only the fields the sync pipeline reads are modelled; unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushEvent {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub commits: Option<Vec<PushCommit>>,
    #[serde(default)]
    pub head_commit: Option<PushCommit>,
    /// Present on subscription ping deliveries.
    #[serde(default)]
    pub zen: Option<String>,
    #[serde(default)]
    pub hook: Option<serde_json::Value>,
}

impl PushEvent {
    /// Ping deliveries carry `zen`/`hook` and no changes.
    pub fn is_ping(&self) -> bool {
        self.zen.is_some() || self.hook.is_some()
    }

    /// Build revision metadata from `after` and the head commit.
    ///
    /// Falls back to the last bundled commit when `head_commit` is absent.
    pub fn revision_info(&self) -> Option<RevisionInfo> {
        let revision = self.after.clone()?;
        let head = self
            .head_commit
            .as_ref()
            .or_else(|| self.commits.as_ref().and_then(|c| c.last()));

        Some(match head {
            Some(commit) => RevisionInfo {
                revision,
                message: commit.message.clone(),
                author: commit.author.name.clone(),
                timestamp: commit.timestamp.clone(),
            },
            None => RevisionInfo::new(revision),
        })
    }
}
