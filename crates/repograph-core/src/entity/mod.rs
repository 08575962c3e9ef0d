//! Graph entities: modules, classes, methods and subroutines.

pub mod model;

pub use model::{
    Entity, EntityKind, EntityPayload, EntityStatus, Relation, RelationKind, StoredState,
};

/// Whether `path` belongs to the file at `file_path`: the file's own module,
/// or any `file_path:line` sub-entity.
pub fn belongs_to_file(path: &str, file_path: &str) -> bool {
    path == file_path
        || path
            .strip_prefix(file_path)
            .is_some_and(|rest| rest.starts_with(':'))
}
