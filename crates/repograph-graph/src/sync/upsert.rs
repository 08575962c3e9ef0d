//! Graph upsert engine.
//!
//! Every call applies one revision inside one transaction: snapshot, deletion
//! flips, entity upserts, relation merges, then the revision's processed
//! marker. Any store failure rolls the whole revision back. The engine bumps
//! `version` on every call; callers guard against re-applying a revision.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use repograph_core::{Entity, EntityStatus, RepographError, RepographResult, RevisionInfo};

use super::{snapshot, SyncResult};
use crate::store::{GraphStore, GraphTxn};

/// Applies extracted entities for a revision to the graph.
#[derive(Clone)]
pub struct UpsertEngine {
    store: Arc<dyn GraphStore>,
    snapshots_enabled: bool,
}

impl UpsertEngine {
    pub fn new(store: Arc<dyn GraphStore>, snapshots_enabled: bool) -> Self {
        Self {
            store,
            snapshots_enabled,
        }
    }

    /// Apply `entities` and the removal of `removed` files for one revision, atomically.
    pub async fn apply_revision(
        &self,
        info: &RevisionInfo,
        entities: Vec<Entity>,
        removed: &[String],
    ) -> RepographResult<SyncResult> {
        let revision = info.revision.as_str();
        let timestamp = Utc::now().to_rfc3339();

        let mut txn = self
            .store
            .begin()
            .await
            .map_err(|e| RepographError::transaction(revision, format!("{e:#}")))?;

        match self.apply_in(txn.as_mut(), revision, &timestamp, entities, removed).await {
            Ok(result) => {
                txn.commit()
                    .await
                    .map_err(|e| RepographError::transaction(revision, format!("{e:#}")))?;

                info!(
                    revision,
                    created = result.nodes_created,
                    updated = result.nodes_updated,
                    deleted = result.nodes_deleted,
                    relationships = result.relationships_created,
                    skipped = result.relationships_skipped,
                    "Revision applied"
                );
                Ok(result)
            }
            Err(e) => {
                error!(revision, error = %format!("{e:#}"), "Revision failed, rolling back");
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(revision, error = %format!("{rollback_err:#}"), "Transaction rollback failed");
                }
                Err(RepographError::transaction(revision, format!("{e:#}")))
            }
        }
    }

    async fn apply_in(
        &self,
        txn: &mut dyn GraphTxn,
        revision: &str,
        timestamp: &str,
        mut entities: Vec<Entity>,
        removed: &[String],
    ) -> Result<SyncResult> {
        let mut result = SyncResult::default();

        if self.snapshots_enabled {
            result.snapshot_tagged = snapshot::tag_snapshot(txn, revision, timestamp).await?;
        }

        for file_path in removed {
            let flipped = txn.mark_file_deleted(file_path, revision, timestamp).await?;
            debug!(revision, path = %file_path, flipped, "Marked file deleted");
            result.nodes_deleted += flipped;
        }

        for entity in entities.iter_mut() {
            match txn.find_entity(entity.kind, &entity.path).await? {
                Some(stored) => {
                    entity.version = stored.version + 1;
                    entity.old_status = stored.status;
                    result.nodes_updated += 1;
                }
                None => {
                    entity.version = 1;
                    entity.old_status = None;
                    result.nodes_created += 1;
                }
            }
            entity.status = EntityStatus::Active;
            entity.revision = revision.to_string();
            txn.write_entity(entity).await?;
        }

        for entity in &entities {
            for relation in &entity.relations {
                if txn.merge_relation(relation, entity.kind, &entity.path, timestamp).await? {
                    result.relationships_created += 1;
                } else {
                    let err = RepographError::RelationResolution {
                        label: relation.container_kind.label().to_string(),
                        path: relation.container_path.clone(),
                    };
                    warn!(revision, path = %entity.path, error = %err, "Skipping relation");
                    result.relationships_skipped += 1;
                }
            }
        }

        txn.mark_revision_processed(revision, timestamp).await?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repograph_core::{EntityKind, Extractor, FileContent};

    use crate::store::MemoryGraph;

    fn file(path: &str, text: &str) -> FileContent {
        FileContent {
            path: path.to_string(),
            text: text.to_string(),
            content_hash: format!("sha-{}", text.len()),
            size: text.len() as i64,
        }
    }

    fn engine(graph: &MemoryGraph) -> UpsertEngine {
        UpsertEngine::new(Arc::new(graph.clone()), true)
    }

    #[tokio::test]
    async fn test_reapplying_bumps_version_each_time() {
        let graph = MemoryGraph::new();
        let engine = engine(&graph);
        let entities = Extractor::default().extract_file(&file("a.py", "def f():\n    pass\n"), "r1", "t1");

        for _ in 0..3 {
            engine
                .apply_revision(&RevisionInfo::new("r1"), entities.clone(), &[])
                .await
                .unwrap();
        }

        let module = graph.entity(EntityKind::Module, "a.py").unwrap();
        assert_eq!(module.version, 3);
        assert_eq!(module.old_status, Some(EntityStatus::Active));
        assert_eq!(graph.entity(EntityKind::Subroutine, "a.py:1").unwrap().version, 3);
        assert_eq!(graph.edge_count(), 1);
    }

    #[tokio::test]
    async fn test_commit_failure_is_transaction_error() {
        let graph = MemoryGraph::new();
        graph.set_fail_commits(true);
        let entities = Extractor::default().extract_file(&file("a.py", "x = 1\n"), "r1", "t1");

        let err = engine(&graph)
            .apply_revision(&RevisionInfo::new("r1"), entities, &[])
            .await
            .unwrap_err();

        assert!(matches!(err, RepographError::Transaction { ref revision, .. } if revision == "r1"));
        assert!(graph.entities().is_empty());
        assert!(graph.snapshot_revisions().is_empty());
        assert!(!graph.revision_processed("r1").await.unwrap());
    }

    #[tokio::test]
    async fn test_revision_without_entities_is_marked_processed() {
        let graph = MemoryGraph::new();

        engine(&graph)
            .apply_revision(&RevisionInfo::new("docs-only"), Vec::new(), &[])
            .await
            .unwrap();

        assert!(graph.entities().is_empty());
        assert!(graph.revision_processed("docs-only").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_container_skips_relation() {
        let graph = MemoryGraph::new();
        let mut entities = Extractor::default().extract_file(&file("a.py", "class A:\n    pass\n"), "r1", "t1");
        // Drop the module so the class has nothing to attach to.
        entities.retain(|e| e.kind != EntityKind::Module);

        let result = engine(&graph)
            .apply_revision(&RevisionInfo::new("r1"), entities, &[])
            .await
            .unwrap();

        assert_eq!(result.nodes_created, 1);
        assert_eq!(result.relationships_skipped, 1);
        assert!(graph.entity(EntityKind::Class, "a.py:1").is_some());
    }

    #[tokio::test]
    async fn test_upserting_deleted_path_undeletes() {
        let graph = MemoryGraph::new();
        let engine = engine(&graph);
        let entities = Extractor::default().extract_file(&file("a.py", "x = 1\n"), "r1", "t1");

        engine
            .apply_revision(&RevisionInfo::new("r1"), entities.clone(), &[])
            .await
            .unwrap();
        let removed = engine
            .apply_revision(&RevisionInfo::new("r2"), Vec::new(), &["a.py".to_string()])
            .await
            .unwrap();
        assert_eq!(removed.nodes_deleted, 1);
        assert_eq!(
            graph.entity(EntityKind::Module, "a.py").unwrap().status,
            EntityStatus::Deleted
        );

        engine
            .apply_revision(&RevisionInfo::new("r3"), entities, &[])
            .await
            .unwrap();
        let module = graph.entity(EntityKind::Module, "a.py").unwrap();
        assert_eq!(module.status, EntityStatus::Active);
        assert_eq!(module.old_status, Some(EntityStatus::Deleted));
        assert_eq!(module.version, 2);
        assert_eq!(module.revision, "r3");
    }
}
