//! Change extraction from push events and source-file filtering.

pub mod collector;

pub use collector::{ChangeCollector, CollectorSettings};

use std::collections::BTreeSet;

use serde::Serialize;

use crate::revision::PushEvent;

/// Extensions of files worth mirroring into the graph.
const CODE_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "jsx", "tsx", "java", "cpp", "c", "h", "hpp", "cs", "php", "rb", "go", "rs",
    "swift", "kt", "scala", "r", "sql", "sh", "bash", "ps1", "yaml", "yml", "json", "xml",
];

/// Build, dependency and tooling directories that are never mirrored.
const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "__pycache__",
    ".pytest_cache",
    "dist",
    "build",
    ".vscode",
    ".idea",
    "venv",
    "env",
];

/// Whether a repository path is a source file we extract from.
pub fn is_code_file(path: &str) -> bool {
    let mut components = path.split('/').filter(|c| !c.is_empty()).peekable();
    let mut file_name = None;

    while let Some(component) = components.next() {
        if components.peek().is_none() {
            file_name = Some(component);
        } else if IGNORED_DIRS.contains(&component) {
            return false;
        }
    }

    let Some(file_name) = file_name else {
        return false;
    };

    file_name
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| {
            !stem.is_empty() && CODE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        })
}

/// Files touched by a push, unioned across all bundled commits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub added: BTreeSet<String>,
    pub modified: BTreeSet<String>,
    pub removed: BTreeSet<String>,
}

impl ChangeSet {
    /// Merge the per-commit add/modify/remove lists of a push event.
    pub fn from_event(event: &PushEvent) -> Self {
        let mut changes = ChangeSet::default();

        for commit in event.commits.iter().flatten() {
            changes.added.extend(commit.added.iter().cloned());
            changes.modified.extend(commit.modified.iter().cloned());
            changes.removed.extend(commit.removed.iter().cloned());
        }

        changes
    }

    /// Added and modified paths, deduplicated.
    pub fn changed_paths(&self) -> Vec<String> {
        self.added.union(&self.modified).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::PushCommit;

    fn commit(added: &[&str], modified: &[&str], removed: &[&str]) -> PushCommit {
        let owned = |paths: &[&str]| paths.iter().map(|p| p.to_string()).collect();
        PushCommit {
            added: owned(added),
            modified: owned(modified),
            removed: owned(removed),
            ..Default::default()
        }
    }

    #[test]
    fn test_change_set_union_across_commits() {
        let event = PushEvent {
            after: Some("r2".to_string()),
            commits: Some(vec![
                commit(&["a.py", "b.py"], &["c.py"], &[]),
                commit(&["a.py"], &["c.py", "d.py"], &["old.py"]),
            ]),
            ..Default::default()
        };

        let changes = ChangeSet::from_event(&event);
        assert_eq!(changes.added.len(), 2);
        assert_eq!(changes.modified.len(), 2);
        assert_eq!(changes.removed.len(), 1);
        assert_eq!(changes.changed_paths(), vec!["a.py", "b.py", "c.py", "d.py"]);
        assert!(!changes.is_empty());
    }

    #[test]
    fn test_empty_event() {
        let changes = ChangeSet::from_event(&PushEvent::default());
        assert!(changes.is_empty());
        assert!(changes.changed_paths().is_empty());
    }

    #[test]
    fn test_is_code_file() {
        assert!(is_code_file("src/main.py"));
        assert!(is_code_file("web/App.TSX"));
        assert!(is_code_file("deploy/values.yaml"));
        assert!(!is_code_file("README.md"));
        assert!(!is_code_file("node_modules/left-pad/index.js"));
        assert!(!is_code_file("pkg/__pycache__/mod.py"));
        assert!(!is_code_file("app/build/gen.java"));
        assert!(!is_code_file(".gitignore"));
        assert!(!is_code_file("src/"));
    }

    #[test]
    fn test_ignored_dirs_match_whole_components() {
        assert!(is_code_file("environment/setup.py"));
        assert!(is_code_file("rebuild/run.sh"));
        assert!(!is_code_file("tools/env/activate.sh"));
    }
}
