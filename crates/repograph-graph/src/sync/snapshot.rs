//! Snapshot tagging and coarse whole-graph rollback.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use repograph_core::{RepographError, RepographResult};

use crate::store::{GraphStore, GraphTxn};

/// Outcome of a rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollbackReport {
    pub revision: String,
    pub rolled_back: usize,
    pub reactivated: usize,
}

/// Record a snapshot for `revision` inside an open transaction.
pub async fn tag_snapshot(txn: &mut dyn GraphTxn, revision: &str, timestamp: &str) -> Result<usize> {
    let tagged = txn.create_snapshot(revision, timestamp).await?;
    debug!(revision, tagged, "Snapshot created");
    Ok(tagged)
}

/// Creates snapshots and restores the graph to them.
#[derive(Clone)]
pub struct SnapshotManager {
    store: Arc<dyn GraphStore>,
    enabled: bool,
}

impl SnapshotManager {
    pub fn new(store: Arc<dyn GraphStore>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Create a snapshot for `revision` in its own transaction.
    pub async fn create_snapshot(&self, revision: &str) -> RepographResult<usize> {
        let timestamp = Utc::now().to_rfc3339();
        let mut txn = self.store.begin().await.map_err(RepographError::graph)?;

        match tag_snapshot(txn.as_mut(), revision, &timestamp).await {
            Ok(tagged) => {
                txn.commit()
                    .await
                    .map_err(|e| RepographError::transaction(revision, format!("{e:#}")))?;
                Ok(tagged)
            }
            Err(e) => {
                discard(txn, revision).await;
                Err(RepographError::transaction(revision, format!("{e:#}")))
            }
        }
    }

    /// Roll the graph back to the snapshot of `revision`.
    ///
    /// Every active entity last written by another revision becomes
    /// rolled_back, then every rolled_back entity tagged by the target
    /// snapshot or last written by the target revision is reactivated. Fails
    /// without touching the graph when no snapshot exists.
    pub async fn rollback(&self, revision: &str) -> RepographResult<RollbackReport> {
        if !self.enabled {
            return Err(RepographError::RollbackDisabled);
        }

        let mut txn = self.store.begin().await.map_err(RepographError::graph)?;

        let exists = match txn.snapshot_exists(revision).await {
            Ok(exists) => exists,
            Err(e) => {
                discard(txn, revision).await;
                return Err(RepographError::graph(e));
            }
        };
        if !exists {
            discard(txn, revision).await;
            warn!(revision, "Rollback requested for revision without snapshot");
            return Err(RepographError::RollbackNotFound(revision.to_string()));
        }

        match flip_to_snapshot(txn.as_mut(), revision).await {
            Ok((rolled_back, reactivated)) => {
                txn.commit()
                    .await
                    .map_err(|e| RepographError::transaction(revision, format!("{e:#}")))?;
                info!(revision, rolled_back, reactivated, "Rolled back graph");
                Ok(RollbackReport {
                    revision: revision.to_string(),
                    rolled_back,
                    reactivated,
                })
            }
            Err(e) => {
                discard(txn, revision).await;
                Err(RepographError::transaction(revision, format!("{e:#}")))
            }
        }
    }
}

async fn discard(txn: Box<dyn GraphTxn>, revision: &str) {
    if let Err(e) = txn.rollback().await {
        warn!(revision, error = %format!("{e:#}"), "Transaction rollback failed");
    }
}

async fn flip_to_snapshot(txn: &mut dyn GraphTxn, revision: &str) -> Result<(usize, usize)> {
    let rolled_back = txn.mark_rolled_back_except(revision).await?;
    let reactivated = txn.reactivate_snapshot(revision).await?;
    Ok((rolled_back, reactivated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use repograph_core::{EntityKind, EntityStatus, Extractor, FileContent, RevisionInfo};

    use crate::store::MemoryGraph;
    use crate::sync::UpsertEngine;

    fn file(path: &str, text: &str) -> FileContent {
        FileContent {
            path: path.to_string(),
            text: text.to_string(),
            content_hash: String::new(),
            size: text.len() as i64,
        }
    }

    async fn apply(graph: &MemoryGraph, revision: &str, path: &str) {
        let entities = Extractor::default().extract_file(&file(path, "x = 1\n"), revision, "t");
        UpsertEngine::new(Arc::new(graph.clone()), true)
            .apply_revision(&RevisionInfo::new(revision), entities, &[])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_tags_active_entities() {
        let graph = MemoryGraph::new();
        apply(&graph, "r1", "a.py").await;

        let manager = SnapshotManager::new(Arc::new(graph.clone()), true);
        assert_eq!(manager.create_snapshot("manual").await.unwrap(), 1);
        assert_eq!(
            graph.snapshot_tag(EntityKind::Module, "a.py").as_deref(),
            Some("manual")
        );
        assert!(graph.snapshot_revisions().contains("manual"));
    }

    #[tokio::test]
    async fn test_rollback_without_snapshot_leaves_graph_untouched() {
        let graph = MemoryGraph::new();
        apply(&graph, "r1", "a.py").await;
        let before = graph.entities();

        let manager = SnapshotManager::new(Arc::new(graph.clone()), true);
        let err = manager.rollback("nope").await.unwrap_err();

        assert!(matches!(err, RepographError::RollbackNotFound(ref r) if r == "nope"));
        assert_eq!(graph.entities(), before);
    }

    #[tokio::test]
    async fn test_rollback_restores_target_revision() {
        let graph = MemoryGraph::new();
        apply(&graph, "r1", "a.py").await;
        apply(&graph, "r2", "b.py").await;

        let manager = SnapshotManager::new(Arc::new(graph.clone()), true);
        let report = manager.rollback("r1").await.unwrap();
        assert_eq!(report.rolled_back, 1);

        assert_eq!(graph.entity(EntityKind::Module, "a.py").unwrap().status, EntityStatus::Active);
        let b = graph.entity(EntityKind::Module, "b.py").unwrap();
        assert_eq!(b.status, EntityStatus::RolledBack);
        assert_eq!(b.old_status, Some(EntityStatus::Active));
    }

    #[tokio::test]
    async fn test_rollback_reactivates_snapshot_members() {
        let graph = MemoryGraph::new();
        apply(&graph, "r1", "a.py").await;
        apply(&graph, "r2", "b.py").await;
        // The r3 snapshot tags a.py and b.py before r3's own writes land.
        apply(&graph, "r3", "c.py").await;

        let manager = SnapshotManager::new(Arc::new(graph.clone()), true);
        let report = manager.rollback("r3").await.unwrap();
        assert_eq!((report.rolled_back, report.reactivated), (2, 2));
        assert!(graph.entities().iter().all(|e| e.status == EntityStatus::Active));

        // Later snapshots retagged a.py, so r2 only keeps its own writes.
        let report = manager.rollback("r2").await.unwrap();
        assert_eq!((report.rolled_back, report.reactivated), (2, 0));
        assert_eq!(graph.entity(EntityKind::Module, "a.py").unwrap().status, EntityStatus::RolledBack);
        assert_eq!(graph.entity(EntityKind::Module, "b.py").unwrap().status, EntityStatus::Active);
        assert_eq!(graph.entity(EntityKind::Module, "c.py").unwrap().status, EntityStatus::RolledBack);
    }

    #[tokio::test]
    async fn test_repeated_rollback_restores_target_writes() {
        let graph = MemoryGraph::new();
        apply(&graph, "r1", "a.py").await;
        apply(&graph, "r2", "b.py").await;
        apply(&graph, "r3", "c.py").await;

        let manager = SnapshotManager::new(Arc::new(graph.clone()), true);
        manager.rollback("r2").await.unwrap();
        assert_eq!(graph.entity(EntityKind::Module, "c.py").unwrap().status, EntityStatus::RolledBack);

        // c.py was written after the r3 snapshot, so only its revision ties it to r3.
        let report = manager.rollback("r3").await.unwrap();
        let c = graph.entity(EntityKind::Module, "c.py").unwrap();
        assert_eq!(c.revision, "r3");
        assert_eq!(c.status, EntityStatus::Active);
        assert_eq!(c.old_status, Some(EntityStatus::RolledBack));
        assert_eq!(report.rolled_back, 1);
        assert_eq!(report.reactivated, 3);
        assert!(graph.entities().iter().all(|e| e.status == EntityStatus::Active));
    }

    #[tokio::test]
    async fn test_disabled_rollback() {
        let manager = SnapshotManager::new(Arc::new(MemoryGraph::new()), false);
        assert!(matches!(
            manager.rollback("r1").await.unwrap_err(),
            RepographError::RollbackDisabled
        ));
    }
}
