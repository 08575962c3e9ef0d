//! Neo4j schema initialization (constraints and indexes).

use anyhow::Result;
use neo4rs::Query;
use tracing::info;

use repograph_core::EntityKind;

use crate::GraphClient;

/// Label of snapshot marker nodes.
pub const SNAPSHOT_LABEL: &str = "GraphSnapshot";

/// Label of per-revision processed markers.
pub const PROCESSED_LABEL: &str = "SyncedRevision";

/// Cypher statements for schema initialization.
pub fn schema_statements() -> Vec<String> {
    let mut statements = Vec::new();

    for kind in EntityKind::ALL {
        let label = kind.label();
        let lower = label.to_lowercase();
        statements.push(format!(
            "CREATE CONSTRAINT {lower}_path IF NOT EXISTS FOR (n:{label}) REQUIRE n.path IS UNIQUE"
        ));
        for property in ["revision", "status", "last_updated", "snapshot_revision"] {
            statements.push(format!(
                "CREATE INDEX {lower}_{property} IF NOT EXISTS FOR (n:{label}) ON (n.{property})"
            ));
        }
    }

    statements.push(format!(
        "CREATE INDEX snapshot_revision IF NOT EXISTS FOR (s:{SNAPSHOT_LABEL}) ON (s.revision)"
    ));
    statements.push(format!(
        "CREATE CONSTRAINT synced_revision IF NOT EXISTS FOR (p:{PROCESSED_LABEL}) REQUIRE p.revision IS UNIQUE"
    ));
    statements
}

/// Predicate matching any entity label on variable `var`.
pub fn entity_label_predicate(var: &str) -> String {
    let labels: Vec<String> = EntityKind::ALL
        .iter()
        .map(|kind| format!("{var}:{}", kind.label()))
        .collect();
    format!("({})", labels.join(" OR "))
}

/// Initialize Neo4j schema with constraints and indexes.
///
/// Safe to run multiple times - uses IF NOT EXISTS clauses.
pub async fn initialize_schema(client: &GraphClient) -> Result<()> {
    info!("Initializing Neo4j schema...");

    let statements = schema_statements();
    for statement in &statements {
        client.execute(Query::new(statement.clone())).await?;
    }

    info!("Neo4j schema initialized ({} statements)", statements.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_path_constraint_per_label() {
        let statements = schema_statements();
        for kind in EntityKind::ALL {
            let expected = format!("FOR (n:{}) REQUIRE n.path IS UNIQUE", kind.label());
            assert!(statements.iter().any(|s| s.contains(&expected)), "missing {expected}");
        }
        assert!(statements.iter().all(|s| s.contains("IF NOT EXISTS")));
    }

    #[test]
    fn test_processed_marker_is_unique_per_revision() {
        let expected = format!("FOR (p:{PROCESSED_LABEL}) REQUIRE p.revision IS UNIQUE");
        assert!(schema_statements().iter().any(|s| s.contains(&expected)));
    }

    #[test]
    fn test_entity_label_predicate() {
        assert_eq!(
            entity_label_predicate("n"),
            "(n:Module OR n:Class OR n:Method OR n:Subroutine)"
        );
    }
}
