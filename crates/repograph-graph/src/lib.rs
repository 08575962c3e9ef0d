//! # Repograph Graph
//!
//! Neo4j mirror of a repository's code structure.
//!
//! Provides the graph store (Neo4j and in-memory), schema bootstrap, the
//! versioned upsert engine, snapshot rollback, the sync pipeline and the
//! reconciliation loop.

pub mod client;
pub mod schema;
pub mod store;
pub mod sync;

pub use client::{GraphClient, GraphConfig, GraphCounts};
pub use store::{GraphHealth, GraphStore, GraphTxn, MemoryGraph, Neo4jStore};
pub use sync::{
    PushOutcome, ReconcileReport, Reconciler, RollbackReport, SnapshotManager, SyncPipeline, SyncResult,
    UpsertEngine,
};
