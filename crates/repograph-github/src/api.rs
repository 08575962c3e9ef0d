//! GitHub API payloads and their conversion into core types.

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use repograph_core::source::{FileContent, TreeEntry, TreeEntryKind};
use repograph_core::RevisionInfo;

/// Branch history query. Every value travels as a variable.
pub const HISTORY_QUERY: &str = r#"
query RecentHistory($owner: String!, $name: String!, $qualifiedName: String!, $first: Int!) {
  repository(owner: $owner, name: $name) {
    ref(qualifiedName: $qualifiedName) {
      target {
        ... on Commit {
          history(first: $first) {
            nodes {
              oid
              message
              author { name email }
              committedDate
            }
          }
        }
      }
    }
  }
}
"#;

/// GraphQL caps connection page sizes at 100.
pub const MAX_HISTORY_PAGE: usize = 100;

// ── REST: contents ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ContentResponse {
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub size: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl ContentResponse {
    /// Decode the base64 body into UTF-8 text.
    pub fn into_file(self) -> Result<FileContent> {
        if self.kind != "file" {
            bail!("'{}' is a {}, not a file", self.path, self.kind);
        }
        match self.encoding.as_deref() {
            Some("base64") => {}
            other => bail!("'{}' has unsupported encoding {:?}", self.path, other),
        }

        let encoded: String = self
            .content
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = STANDARD
            .decode(encoded.as_bytes())
            .with_context(|| format!("Invalid base64 content for '{}'", self.path))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| anyhow!("'{}' is not valid UTF-8", self.path))?;

        Ok(FileContent {
            path: self.path,
            text,
            content_hash: self.sha,
            size: self.size,
        })
    }
}

// ── REST: trees ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TreeResponse {
    #[serde(default)]
    pub tree: Vec<TreeItem>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
pub struct TreeItem {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TreeItem {
    pub fn into_entry(self) -> Option<TreeEntry> {
        let kind = match self.kind.as_str() {
            "blob" => TreeEntryKind::Blob,
            "tree" => TreeEntryKind::Tree,
            "commit" => TreeEntryKind::Submodule,
            _ => return None,
        };
        Some(TreeEntry { path: self.path, kind })
    }
}

// ── GraphQL: history ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a, V: Serialize> {
    pub query: &'a str,
    pub variables: V,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryVariables<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub qualified_name: String,
    pub first: usize,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryData {
    repository: Option<Repository>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    #[serde(rename = "ref")]
    reference: Option<Reference>,
}

#[derive(Debug, Deserialize)]
struct Reference {
    target: Option<Target>,
}

#[derive(Debug, Deserialize)]
struct Target {
    history: Option<History>,
}

#[derive(Debug, Deserialize)]
struct History {
    #[serde(default)]
    nodes: Vec<CommitNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitNode {
    oid: String,
    #[serde(default)]
    message: String,
    author: Option<CommitAuthor>,
    #[serde(default)]
    committed_date: String,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    name: Option<String>,
}

/// Unwrap a history response into revisions, newest first.
pub fn history_from_response(response: GraphQlResponse<HistoryData>) -> Result<Vec<RevisionInfo>> {
    if !response.errors.is_empty() {
        let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
        bail!("GraphQL API error: {}", messages.join("; "));
    }

    let repository = response
        .data
        .and_then(|d| d.repository)
        .ok_or_else(|| anyhow!("Repository not found"))?;
    let reference = repository
        .reference
        .ok_or_else(|| anyhow!("Branch not found"))?;

    let nodes = reference
        .target
        .and_then(|t| t.history)
        .map(|h| h.nodes)
        .unwrap_or_default();

    Ok(nodes
        .into_iter()
        .map(|node| RevisionInfo {
            revision: node.oid,
            message: node.message,
            author: node.author.and_then(|a| a.name).unwrap_or_default(),
            timestamp: node.committed_date,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content(body: serde_json::Value) -> ContentResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_content_decodes_wrapped_base64() {
        // GitHub wraps base64 bodies at 60 columns.
        let file = content(json!({
            "path": "src/a.py",
            "sha": "3d21ec53",
            "size": 11,
            "type": "file",
            "encoding": "base64",
            "content": "eCA9IDEK\neSA9IDIK\n"
        }))
        .into_file()
        .unwrap();

        assert_eq!(file.text, "x = 1\ny = 2\n");
        assert_eq!(file.content_hash, "3d21ec53");
        assert_eq!(file.path, "src/a.py");
    }

    #[test]
    fn test_content_rejects_directories_and_large_files() {
        let dir = content(json!({"path": "src", "sha": "1", "type": "dir"}));
        assert!(dir.into_file().is_err());

        let large = content(json!({
            "path": "big.json", "sha": "2", "type": "file", "encoding": "none", "content": ""
        }));
        assert!(large.into_file().is_err());
    }

    #[test]
    fn test_content_rejects_binary() {
        let binary = content(json!({
            "path": "a.py", "sha": "3", "type": "file", "encoding": "base64", "content": "/w=="
        }));
        let err = binary.into_file().unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_tree_items() {
        let tree: TreeResponse = serde_json::from_value(json!({
            "sha": "abc",
            "tree": [
                {"path": "src", "type": "tree"},
                {"path": "src/a.py", "type": "blob"},
                {"path": "vendor/lib", "type": "commit"},
                {"path": "odd", "type": "symlink"}
            ],
            "truncated": false
        }))
        .unwrap();

        let entries: Vec<TreeEntry> = tree.tree.into_iter().filter_map(TreeItem::into_entry).collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].kind, TreeEntryKind::Blob);
        assert_eq!(entries[2].kind, TreeEntryKind::Submodule);
    }

    #[test]
    fn test_history_response() {
        let response: GraphQlResponse<HistoryData> = serde_json::from_value(json!({
            "data": {"repository": {"ref": {"target": {"history": {"nodes": [
                {"oid": "r2", "message": "second", "author": {"name": "ana", "email": "a@x"}, "committedDate": "2024-05-02T00:00:00Z"},
                {"oid": "r1", "message": "first", "author": null, "committedDate": "2024-05-01T00:00:00Z"}
            ]}}}}}
        }))
        .unwrap();

        let history = history_from_response(response).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].revision, "r2");
        assert_eq!(history[0].author, "ana");
        assert_eq!(history[1].author, "");
    }

    #[test]
    fn test_history_errors() {
        let missing_branch: GraphQlResponse<HistoryData> =
            serde_json::from_value(json!({"data": {"repository": {"ref": null}}})).unwrap();
        assert!(history_from_response(missing_branch)
            .unwrap_err()
            .to_string()
            .contains("Branch not found"));

        let errors: GraphQlResponse<HistoryData> = serde_json::from_value(json!({
            "data": null,
            "errors": [{"message": "Could not resolve to a Repository"}]
        }))
        .unwrap();
        assert!(history_from_response(errors).is_err());
    }

    #[test]
    fn test_history_variables_are_camel_case() {
        let body = serde_json::to_value(GraphQlRequest {
            query: HISTORY_QUERY,
            variables: HistoryVariables {
                owner: "acme",
                name: "widgets",
                qualified_name: "refs/heads/main".to_string(),
                first: 10,
            },
        })
        .unwrap();

        assert_eq!(body["variables"]["qualifiedName"], "refs/heads/main");
        assert_eq!(body["variables"]["first"], 10);
    }
}
