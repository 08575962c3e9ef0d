//! Graph store collaborator.
//!
//! All mutations for one revision run inside a single [`GraphTxn`]; the
//! store itself only answers read-only questions outside a transaction.

pub mod memory;
pub mod neo4j;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use repograph_core::entity::StoredState;
use repograph_core::{Entity, EntityKind, Relation};

pub use memory::MemoryGraph;
pub use neo4j::Neo4jStore;

/// Active-entity count and most recent write, for health reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphHealth {
    pub active_nodes: i64,
    pub last_commit: Option<String>,
    pub last_updated: Option<String>,
}

/// One atomic unit of graph mutation.
///
/// Dropping a transaction without committing discards its writes.
#[async_trait]
pub trait GraphTxn: Send {
    /// Stored version and status of `path` under `kind`'s label.
    async fn find_entity(&mut self, kind: EntityKind, path: &str) -> Result<Option<StoredState>>;

    /// Merge the entity keyed on `path` and overwrite every attribute.
    async fn write_entity(&mut self, entity: &Entity) -> Result<()>;

    /// Merge the container -> contained edge. Returns false when an endpoint is missing.
    async fn merge_relation(
        &mut self,
        relation: &Relation,
        contained_kind: EntityKind,
        contained_path: &str,
        created_at: &str,
    ) -> Result<bool>;

    /// Flip every entity of `file_path` to deleted. Returns the number flipped.
    async fn mark_file_deleted(&mut self, file_path: &str, revision: &str, timestamp: &str) -> Result<usize>;

    /// Record a snapshot marker and tag every active entity with it.
    async fn create_snapshot(&mut self, revision: &str, timestamp: &str) -> Result<usize>;

    async fn snapshot_exists(&mut self, revision: &str) -> Result<bool>;

    /// Record that `revision` has been applied, independent of which entities it touched.
    async fn mark_revision_processed(&mut self, revision: &str, timestamp: &str) -> Result<()>;

    /// Flip every entity whose revision differs from `revision` to rolled_back.
    async fn mark_rolled_back_except(&mut self, revision: &str) -> Result<usize>;

    /// Reactivate every rolled_back entity tagged by the snapshot of `revision`
    /// or last written by `revision`.
    async fn reactivate_snapshot(&mut self, revision: &str) -> Result<usize>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Process-wide handle to the graph, safe for concurrent units of work.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn GraphTxn>>;

    /// Whether `revision` carries a processed marker or any entity carries it.
    async fn revision_processed(&self, revision: &str) -> Result<bool>;

    async fn health(&self) -> Result<GraphHealth>;
}
