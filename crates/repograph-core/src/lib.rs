//! Repograph Core Library
//!
//! Data model, configuration, change collection and heuristic entity
//! extraction for mirroring a repository's structure into a property graph.

pub mod changes;
pub mod config;
pub mod entity;
pub mod error;
pub mod extract;
pub mod revision;
pub mod source;

pub use changes::{ChangeCollector, ChangeSet, CollectorSettings};
pub use config::SyncConfig;
pub use entity::{Entity, EntityKind, EntityStatus, Relation, RelationKind};
pub use error::{RepographError, RepographResult};
pub use extract::{Extractor, Language};
pub use revision::{PushEvent, RevisionInfo};
pub use source::{FileContent, SourceHost, TreeEntry, TreeEntryKind};
