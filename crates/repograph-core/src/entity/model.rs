//! Graph entity and relation models.

use serde::{Deserialize, Serialize};

use crate::extract::Language;

/// Kind of structural code element. Doubles as the Neo4j node label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Module,
    Class,
    Method,
    Subroutine,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Module,
        EntityKind::Class,
        EntityKind::Method,
        EntityKind::Subroutine,
    ];

    /// The Neo4j node label for this entity kind.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Module => "Module",
            EntityKind::Class => "Class",
            EntityKind::Method => "Method",
            EntityKind::Subroutine => "Subroutine",
        }
    }

    /// Resolve a label against the allow-list. Unknown labels are rejected.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.label() == label)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle status of an entity. Entities are never erased, only flipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Active,
    Deleted,
    RolledBack,
}

impl EntityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Active => "active",
            EntityStatus::Deleted => "deleted",
            EntityStatus::RolledBack => "rolled_back",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "deleted" => Some(Self::Deleted),
            "rolled_back" => Some(Self::RolledBack),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship types between a container and its contained entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    HasClass,
    HasSubroutine,
    DefinesMethod,
}

impl RelationKind {
    pub const ALL: [RelationKind; 3] = [
        RelationKind::HasClass,
        RelationKind::HasSubroutine,
        RelationKind::DefinesMethod,
    ];

    /// The Neo4j relationship type.
    pub fn rel_type(&self) -> &'static str {
        match self {
            RelationKind::HasClass => "has_class",
            RelationKind::HasSubroutine => "has_subroutine",
            RelationKind::DefinesMethod => "defines_method",
        }
    }

    pub fn from_rel_type(rel_type: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.rel_type() == rel_type)
    }
}

/// Link between the entity that owns it and that entity's container.
///
/// Relations are attached to the contained entity and name the container by
/// path; the edge is written container -> contained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub kind: RelationKind,
    pub container_kind: EntityKind,
    pub container_path: String,
}

/// Extraction-specific payload carried on every entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPayload {
    /// Source excerpt (whole file capped for modules, declaration line otherwise).
    pub code: String,
    pub size: i64,
    pub lines: i64,
    pub line_number: Option<i64>,
    pub content_hash: Option<String>,
}

/// A structural code element as produced by extraction and stored in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    /// Stable identity key; `file_path:line_number` for sub-file entities.
    pub path: String,
    pub name: String,
    pub language: Language,
    pub status: EntityStatus,
    pub old_status: Option<EntityStatus>,
    pub revision: String,
    pub last_updated: String,
    pub version: i64,
    pub payload: EntityPayload,
    pub relations: Vec<Relation>,
}

impl Entity {
    /// Path of the file this entity was extracted from.
    pub fn file_path(&self) -> &str {
        match self.kind {
            EntityKind::Module => &self.path,
            _ => self
                .path
                .rsplit_once(':')
                .map(|(file, _)| file)
                .unwrap_or(&self.path),
        }
    }
}

/// Stored state of an entity, as read back before an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredState {
    pub version: i64,
    pub status: Option<EntityStatus>,
}
