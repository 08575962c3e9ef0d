//! In-memory graph store.
//!
//! Mirrors the Neo4j store's semantics closely enough to drive the sync
//! pipeline in dry runs and tests. A transaction reads from a private copy of
//! the graph and records its writes; commit replays those writes onto the
//! shared graph, so concurrent transactions resolve last-writer-wins per write.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{bail, Result};
use async_trait::async_trait;

use repograph_core::entity::{belongs_to_file, StoredState};
use repograph_core::{Entity, EntityKind, EntityStatus, Relation, RelationKind};

use super::{GraphHealth, GraphStore, GraphTxn};

type NodeKey = (EntityKind, String);

/// Container -> contained edge identity. At most one edge per key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EdgeKey {
    pub kind: RelationKind,
    pub from: NodeKey,
    pub to: NodeKey,
}

#[derive(Debug, Clone)]
struct StoredNode {
    entity: Entity,
    snapshot_revision: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct GraphState {
    nodes: BTreeMap<NodeKey, StoredNode>,
    edges: BTreeMap<EdgeKey, String>,
    snapshots: BTreeMap<String, String>,
    processed: BTreeMap<String, String>,
}

/// A recorded write, replayed at commit.
#[derive(Debug, Clone)]
enum Op {
    Write(Entity),
    Relate {
        relation: Relation,
        contained: NodeKey,
        created_at: String,
    },
    DeleteFile {
        file_path: String,
        revision: String,
        timestamp: String,
    },
    Snapshot {
        revision: String,
        timestamp: String,
    },
    MarkProcessed {
        revision: String,
        timestamp: String,
    },
    RollBackExcept(String),
    Reactivate(String),
}

impl GraphState {
    fn apply(&mut self, op: &Op) -> usize {
        match op {
            Op::Write(entity) => {
                let key = (entity.kind, entity.path.clone());
                let snapshot_revision = self.nodes.get(&key).and_then(|n| n.snapshot_revision.clone());
                self.nodes.insert(
                    key,
                    StoredNode {
                        entity: entity.clone(),
                        snapshot_revision,
                    },
                );
                1
            }
            Op::Relate {
                relation,
                contained,
                created_at,
            } => {
                let from = (relation.container_kind, relation.container_path.clone());
                if !self.nodes.contains_key(&from) || !self.nodes.contains_key(contained) {
                    return 0;
                }
                let key = EdgeKey {
                    kind: relation.kind,
                    from,
                    to: contained.clone(),
                };
                self.edges.entry(key).or_insert_with(|| created_at.clone());
                1
            }
            Op::DeleteFile {
                file_path,
                revision,
                timestamp,
            } => self.flip(
                |node| belongs_to_file(&node.entity.path, file_path) && node.entity.status != EntityStatus::Deleted,
                EntityStatus::Deleted,
                Some((revision, timestamp)),
            ),
            Op::Snapshot { revision, timestamp } => {
                self.snapshots
                    .entry(revision.clone())
                    .or_insert_with(|| timestamp.clone());
                let mut tagged = 0;
                for node in self.nodes.values_mut() {
                    if node.entity.status == EntityStatus::Active {
                        node.snapshot_revision = Some(revision.clone());
                        tagged += 1;
                    }
                }
                tagged
            }
            Op::MarkProcessed { revision, timestamp } => {
                self.processed
                    .entry(revision.clone())
                    .or_insert_with(|| timestamp.clone());
                1
            }
            Op::RollBackExcept(revision) => self.flip(
                |node| node.entity.status == EntityStatus::Active && node.entity.revision != *revision,
                EntityStatus::RolledBack,
                None,
            ),
            Op::Reactivate(revision) => self.flip(
                |node| {
                    node.entity.status == EntityStatus::RolledBack
                        && (node.snapshot_revision.as_deref() == Some(revision.as_str())
                            || node.entity.revision == *revision)
                },
                EntityStatus::Active,
                None,
            ),
        }
    }

    fn flip<F>(&mut self, matches: F, status: EntityStatus, touch: Option<(&String, &String)>) -> usize
    where
        F: Fn(&StoredNode) -> bool,
    {
        let mut flipped = 0;
        for node in self.nodes.values_mut().filter(|n| matches(n)) {
            let entity = &mut node.entity;
            entity.old_status = Some(entity.status);
            entity.status = status;
            if let Some((revision, timestamp)) = touch {
                entity.revision = revision.clone();
                entity.last_updated = timestamp.clone();
            }
            flipped += 1;
        }
        flipped
    }
}

/// Graph store held in process memory.
#[derive(Clone, Default)]
pub struct MemoryGraph {
    state: Arc<Mutex<GraphState>>,
    fail_commits: Arc<AtomicBool>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent commit fail until reset.
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, GraphState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn entity(&self, kind: EntityKind, path: &str) -> Option<Entity> {
        self.lock()
            .nodes
            .get(&(kind, path.to_string()))
            .map(|n| n.entity.clone())
    }

    pub fn entities(&self) -> Vec<Entity> {
        self.lock().nodes.values().map(|n| n.entity.clone()).collect()
    }

    pub fn snapshot_tag(&self, kind: EntityKind, path: &str) -> Option<String> {
        self.lock()
            .nodes
            .get(&(kind, path.to_string()))
            .and_then(|n| n.snapshot_revision.clone())
    }

    pub fn has_edge(&self, kind: RelationKind, from: (EntityKind, &str), to: (EntityKind, &str)) -> bool {
        let key = EdgeKey {
            kind,
            from: (from.0, from.1.to_string()),
            to: (to.0, to.1.to_string()),
        };
        self.lock().edges.contains_key(&key)
    }

    pub fn edge_count(&self) -> usize {
        self.lock().edges.len()
    }

    pub fn snapshot_revisions(&self) -> BTreeSet<String> {
        self.lock().snapshots.keys().cloned().collect()
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    async fn begin(&self) -> Result<Box<dyn GraphTxn>> {
        let staged = self.lock().clone();
        Ok(Box::new(MemoryTxn {
            graph: self.clone(),
            staged,
            ops: Vec::new(),
        }))
    }

    async fn revision_processed(&self, revision: &str) -> Result<bool> {
        let state = self.lock();
        Ok(state.processed.contains_key(revision)
            || state.nodes.values().any(|n| n.entity.revision == revision))
    }

    async fn health(&self) -> Result<GraphHealth> {
        let state = self.lock();
        let active_nodes = state
            .nodes
            .values()
            .filter(|n| n.entity.status == EntityStatus::Active)
            .count() as i64;
        let latest = state
            .nodes
            .values()
            .map(|n| &n.entity)
            .filter(|e| !e.last_updated.is_empty())
            .max_by(|a, b| a.last_updated.cmp(&b.last_updated));

        Ok(GraphHealth {
            active_nodes,
            last_commit: latest.map(|e| e.revision.clone()),
            last_updated: latest.map(|e| e.last_updated.clone()),
        })
    }
}

/// Transaction over a [`MemoryGraph`].
pub struct MemoryTxn {
    graph: MemoryGraph,
    staged: GraphState,
    ops: Vec<Op>,
}

impl MemoryTxn {
    fn record(&mut self, op: Op) -> usize {
        let touched = self.staged.apply(&op);
        self.ops.push(op);
        touched
    }
}

#[async_trait]
impl GraphTxn for MemoryTxn {
    async fn find_entity(&mut self, kind: EntityKind, path: &str) -> Result<Option<StoredState>> {
        Ok(self.staged.nodes.get(&(kind, path.to_string())).map(|n| StoredState {
            version: n.entity.version,
            status: Some(n.entity.status),
        }))
    }

    async fn write_entity(&mut self, entity: &Entity) -> Result<()> {
        self.record(Op::Write(entity.clone()));
        Ok(())
    }

    async fn merge_relation(
        &mut self,
        relation: &Relation,
        contained_kind: EntityKind,
        contained_path: &str,
        created_at: &str,
    ) -> Result<bool> {
        let linked = self.record(Op::Relate {
            relation: relation.clone(),
            contained: (contained_kind, contained_path.to_string()),
            created_at: created_at.to_string(),
        });
        Ok(linked > 0)
    }

    async fn mark_file_deleted(&mut self, file_path: &str, revision: &str, timestamp: &str) -> Result<usize> {
        Ok(self.record(Op::DeleteFile {
            file_path: file_path.to_string(),
            revision: revision.to_string(),
            timestamp: timestamp.to_string(),
        }))
    }

    async fn create_snapshot(&mut self, revision: &str, timestamp: &str) -> Result<usize> {
        Ok(self.record(Op::Snapshot {
            revision: revision.to_string(),
            timestamp: timestamp.to_string(),
        }))
    }

    async fn snapshot_exists(&mut self, revision: &str) -> Result<bool> {
        Ok(self.staged.snapshots.contains_key(revision))
    }

    async fn mark_revision_processed(&mut self, revision: &str, timestamp: &str) -> Result<()> {
        self.record(Op::MarkProcessed {
            revision: revision.to_string(),
            timestamp: timestamp.to_string(),
        });
        Ok(())
    }

    async fn mark_rolled_back_except(&mut self, revision: &str) -> Result<usize> {
        Ok(self.record(Op::RollBackExcept(revision.to_string())))
    }

    async fn reactivate_snapshot(&mut self, revision: &str) -> Result<usize> {
        Ok(self.record(Op::Reactivate(revision.to_string())))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        if self.graph.fail_commits.load(Ordering::SeqCst) {
            bail!("commit rejected by store");
        }
        let mut state = self.graph.lock();
        for op in &self.ops {
            state.apply(op);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
