//! File content collection from the source host.
//!
//! Fetches are time-bounded and individually fallible: a file that cannot be
//! fetched is logged and skipped, the rest of the batch proceeds.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::error::{RepographError, RepographResult};
use crate::source::{FileContent, SourceHost, TreeEntryKind};

use super::is_code_file;

/// Pacing and time bounds for host fetches.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    /// Files fetched concurrently per batch.
    pub batch_size: usize,
    /// Pause between batches during full-tree collection.
    pub batch_pause: Duration,
    /// Upper bound on a single host call.
    pub fetch_timeout: Duration,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_pause: Duration::from_millis(500),
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

/// Resolves touched paths into file contents at a revision.
#[derive(Clone)]
pub struct ChangeCollector {
    host: Arc<dyn SourceHost>,
    settings: CollectorSettings,
}

impl ChangeCollector {
    pub fn new(host: Arc<dyn SourceHost>, settings: CollectorSettings) -> Self {
        Self { host, settings }
    }

    pub fn host(&self) -> &Arc<dyn SourceHost> {
        &self.host
    }

    /// Fetch the given paths at `revision`, keeping only source files.
    pub async fn fetch_files(&self, revision: &str, paths: &[String]) -> Vec<FileContent> {
        let code_paths: Vec<String> = paths.iter().filter(|p| is_code_file(p)).cloned().collect();
        debug!(revision, requested = paths.len(), code_files = code_paths.len(), "Fetching changed files");

        let mut files = Vec::with_capacity(code_paths.len());
        for batch in code_paths.chunks(self.batch_size()) {
            files.extend(self.fetch_batch(revision, batch).await);
        }
        files
    }

    /// Fetch every source file of the tree at `revision`, bypassing diffs.
    ///
    /// At most `max_files` files are fetched; the excess is dropped with a
    /// warning. Only a failure to list the tree is an error.
    pub async fn fetch_repository(
        &self,
        revision: &str,
        max_files: usize,
    ) -> RepographResult<Vec<FileContent>> {
        let tree = tokio::time::timeout(self.settings.fetch_timeout, self.host.list_tree(revision))
            .await
            .map_err(|_| RepographError::Fetch {
                path: format!("tree@{revision}"),
                reason: "timed out".to_string(),
            })?
            .map_err(|e| RepographError::Fetch {
                path: format!("tree@{revision}"),
                reason: format!("{e:#}"),
            })?;

        let mut paths: Vec<String> = tree
            .into_iter()
            .filter(|entry| entry.kind == TreeEntryKind::Blob && is_code_file(&entry.path))
            .map(|entry| entry.path)
            .collect();

        if paths.len() > max_files {
            warn!(
                revision,
                total = paths.len(),
                max_files,
                "Repository exceeds file ceiling, truncating"
            );
            paths.truncate(max_files);
        }

        let mut files = Vec::with_capacity(paths.len());
        let mut batches = paths.chunks(self.batch_size()).peekable();
        while let Some(batch) = batches.next() {
            files.extend(self.fetch_batch(revision, batch).await);

            if batches.peek().is_some() && !self.settings.batch_pause.is_zero() {
                tokio::time::sleep(self.settings.batch_pause).await;
            }
        }

        info!(revision, files = files.len(), "Loaded files from repository tree");
        Ok(files)
    }

    fn batch_size(&self) -> usize {
        self.settings.batch_size.max(1)
    }

    async fn fetch_batch(&self, revision: &str, batch: &[String]) -> Vec<FileContent> {
        join_all(batch.iter().map(|path| self.fetch_one(revision, path)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn fetch_one(&self, revision: &str, path: &str) -> Option<FileContent> {
        let fetched =
            tokio::time::timeout(self.settings.fetch_timeout, self.host.fetch_file(path, revision))
                .await;

        let err = match fetched {
            Ok(Ok(file)) => {
                info!(path, chars = file.text.len(), "Loaded file");
                return Some(file);
            }
            Ok(Err(e)) => RepographError::Fetch {
                path: path.to_string(),
                reason: format!("{e:#}"),
            },
            Err(_) => RepographError::Fetch {
                path: path.to_string(),
                reason: format!("timed out after {:?}", self.settings.fetch_timeout),
            },
        };

        warn!(revision, error = %err, "Skipping file");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use anyhow::anyhow;
    use async_trait::async_trait;

    use crate::revision::RevisionInfo;
    use crate::source::TreeEntry;

    #[derive(Default)]
    struct StubHost {
        files: HashMap<String, String>,
        slow: Vec<String>,
        tree: Vec<TreeEntry>,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SourceHost for StubHost {
        async fn fetch_file(&self, path: &str, _revision: &str) -> anyhow::Result<FileContent> {
            self.requested.lock().unwrap().push(path.to_string());
            if self.slow.iter().any(|p| p == path) {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            let text = self
                .files
                .get(path)
                .ok_or_else(|| anyhow!("404 Not Found"))?;
            Ok(FileContent {
                path: path.to_string(),
                text: text.clone(),
                content_hash: format!("sha-{path}"),
                size: text.len() as i64,
            })
        }

        async fn list_tree(&self, _revision: &str) -> anyhow::Result<Vec<TreeEntry>> {
            if self.tree.is_empty() {
                return Err(anyhow!("tree unavailable"));
            }
            Ok(self.tree.clone())
        }

        async fn recent_history(&self, _limit: usize) -> anyhow::Result<Vec<RevisionInfo>> {
            Ok(Vec::new())
        }
    }

    fn settings() -> CollectorSettings {
        CollectorSettings {
            batch_size: 2,
            batch_pause: Duration::ZERO,
            fetch_timeout: Duration::from_millis(100),
        }
    }

    fn blob(path: &str) -> TreeEntry {
        TreeEntry {
            path: path.to_string(),
            kind: TreeEntryKind::Blob,
        }
    }

    #[tokio::test]
    async fn test_failed_and_filtered_files_are_skipped() {
        let mut host = StubHost::default();
        host.files.insert("a.py".into(), "x = 1\n".into());
        host.files.insert("notes.md".into(), "# notes".into());
        let host = Arc::new(host);

        let collector = ChangeCollector::new(host.clone(), settings());
        let files = collector
            .fetch_files(
                "r1",
                &["a.py".to_string(), "missing.py".to_string(), "notes.md".to_string()],
            )
            .await;

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "a.py");
        // Non-code files are never requested from the host.
        assert!(!host.requested.lock().unwrap().contains(&"notes.md".to_string()));
    }

    #[tokio::test]
    async fn test_slow_fetch_is_a_per_file_failure() {
        let mut host = StubHost::default();
        host.files.insert("fast.py".into(), "pass\n".into());
        host.files.insert("slow.py".into(), "pass\n".into());
        host.slow.push("slow.py".into());

        let collector = ChangeCollector::new(Arc::new(host), settings());
        let files = collector
            .fetch_files("r1", &["slow.py".to_string(), "fast.py".to_string()])
            .await;

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "fast.py");
    }

    #[tokio::test]
    async fn test_repository_listing_is_filtered_and_truncated() {
        let mut host = StubHost::default();
        for i in 0..5 {
            let path = format!("src/m{i}.py");
            host.files.insert(path.clone(), "pass\n".into());
            host.tree.push(blob(&path));
        }
        host.tree.push(blob("node_modules/x/index.js"));
        host.tree.push(TreeEntry {
            path: "src".into(),
            kind: TreeEntryKind::Tree,
        });

        let collector = ChangeCollector::new(Arc::new(host), settings());
        let files = collector.fetch_repository("r1", 3).await.unwrap();

        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/m0.py", "src/m1.py", "src/m2.py"]);
    }

    #[tokio::test]
    async fn test_tree_failure_is_fetch_error() {
        let collector = ChangeCollector::new(Arc::new(StubHost::default()), settings());
        let err = collector.fetch_repository("r1", 10).await.unwrap_err();
        assert!(matches!(err, RepographError::Fetch { .. }));
    }
}
