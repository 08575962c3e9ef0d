//! Source host collaborator: file content, tree listing and branch history.

use anyhow::Result;
use async_trait::async_trait;

use crate::revision::RevisionInfo;

/// Content of one file at a revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub path: String,
    pub text: String,
    /// Blob hash reported by the host.
    pub content_hash: String,
    pub size: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEntryKind {
    Blob,
    Tree,
    Submodule,
}

/// One entry of a recursive tree listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub kind: TreeEntryKind,
}

/// Read access to the repository being mirrored.
///
/// Implementations are shared across concurrent units of work.
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// Fetch one file's content at `revision`.
    async fn fetch_file(&self, path: &str, revision: &str) -> Result<FileContent>;

    /// List every entry of the tree at `revision`, recursively.
    async fn list_tree(&self, revision: &str) -> Result<Vec<TreeEntry>>;

    /// The most recent `limit` revisions of the tracked branch, newest first.
    async fn recent_history(&self, limit: usize) -> Result<Vec<RevisionInfo>>;
}
