//! Revision synchronization into the graph.
//!
//! The upsert engine applies one revision per transaction, the snapshot
//! manager tags and restores graph state, the pipeline glues collection and
//! extraction to both, and the reconciler replays missed history.

pub mod pipeline;
pub mod reconcile;
pub mod snapshot;
pub mod upsert;

use serde::Serialize;

pub use pipeline::{PushOutcome, SyncPipeline};
pub use reconcile::{ReconcileReport, Reconciler};
pub use snapshot::{RollbackReport, SnapshotManager};
pub use upsert::UpsertEngine;

/// Result of applying one revision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    pub nodes_created: usize,
    pub nodes_updated: usize,
    pub nodes_deleted: usize,
    pub relationships_created: usize,
    pub relationships_skipped: usize,
    pub snapshot_tagged: usize,
}

impl SyncResult {
    pub fn entities_processed(&self) -> usize {
        self.nodes_created + self.nodes_updated
    }

    pub fn merge(&mut self, other: &SyncResult) {
        self.nodes_created += other.nodes_created;
        self.nodes_updated += other.nodes_updated;
        self.nodes_deleted += other.nodes_deleted;
        self.relationships_created += other.relationships_created;
        self.relationships_skipped += other.relationships_skipped;
        self.snapshot_tagged += other.snapshot_tagged;
    }
}
