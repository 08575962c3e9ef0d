//! Neo4j-backed graph store.
//!
//! Labels and relationship types are interpolated only from the
//! `EntityKind`/`RelationKind` allow-lists; every value is a query parameter.

use anyhow::{Context, Result};
use async_trait::async_trait;
use neo4rs::{Query, Row, Txn};
use tracing::debug;

use repograph_core::entity::StoredState;
use repograph_core::{Entity, EntityKind, EntityStatus, Relation};

use super::{GraphHealth, GraphStore, GraphTxn};
use crate::schema::{entity_label_predicate, PROCESSED_LABEL, SNAPSHOT_LABEL};
use crate::GraphClient;

/// Graph store over a shared Neo4j connection pool.
#[derive(Clone)]
pub struct Neo4jStore {
    client: GraphClient,
}

impl Neo4jStore {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GraphClient {
        &self.client
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn begin(&self) -> Result<Box<dyn GraphTxn>> {
        let txn = self.client.start_txn().await?;
        Ok(Box::new(Neo4jTxn { txn }))
    }

    async fn revision_processed(&self, revision: &str) -> Result<bool> {
        let marker = Query::new(format!(
            "MATCH (p:{PROCESSED_LABEL} {{revision: $revision}}) RETURN count(p) AS hits"
        ))
        .param("revision", revision);
        let marked: i64 = self.client.query_scalar(marker, "hits").await?.unwrap_or(0);
        if marked > 0 {
            return Ok(true);
        }

        // Revisions applied before markers existed are only visible on entities.
        let query = Query::new(format!(
            "MATCH (n) WHERE {} AND n.revision = $revision
             WITH n LIMIT 1
             RETURN count(n) AS hits",
            entity_label_predicate("n")
        ))
        .param("revision", revision);

        let hits: i64 = self.client.query_scalar(query, "hits").await?.unwrap_or(0);
        Ok(hits > 0)
    }

    async fn health(&self) -> Result<GraphHealth> {
        let predicate = entity_label_predicate("n");

        let active_query = Query::new(format!(
            "MATCH (n) WHERE {predicate} AND n.status = $status RETURN count(n) AS active"
        ))
        .param("status", EntityStatus::Active.as_str());
        let active_nodes: i64 = self.client.query_scalar(active_query, "active").await?.unwrap_or(0);

        let latest_query = Query::new(format!(
            "MATCH (n) WHERE {predicate} AND n.last_updated IS NOT NULL
             RETURN n.revision AS revision, n.last_updated AS last_updated
             ORDER BY n.last_updated DESC LIMIT 1"
        ));
        let rows = self.client.query(latest_query).await?;

        let (last_commit, last_updated) = match rows.into_iter().next() {
            Some(row) => (
                row.get::<Option<String>>("revision").ok().flatten(),
                row.get::<Option<String>>("last_updated").ok().flatten(),
            ),
            None => (None, None),
        };

        Ok(GraphHealth {
            active_nodes,
            last_commit,
            last_updated,
        })
    }
}

/// An open Neo4j transaction.
pub struct Neo4jTxn {
    txn: Txn,
}

impl Neo4jTxn {
    async fn rows(&mut self, query: Query) -> Result<Vec<Row>> {
        let mut stream = self.txn.execute(query).await.context("Neo4j query failed")?;

        let mut rows = Vec::new();
        while let Some(row) = stream
            .next(self.txn.handle())
            .await
            .context("Failed to read Neo4j row")?
        {
            rows.push(row);
        }
        Ok(rows)
    }

    async fn count(&mut self, query: Query, field: &str) -> Result<usize> {
        let rows = self.rows(query).await?;
        let count = match rows.into_iter().next() {
            Some(row) => row
                .get::<i64>(field)
                .map_err(|e| anyhow::anyhow!("Failed to get field '{}': {:?}", field, e))?,
            None => 0,
        };
        Ok(count.max(0) as usize)
    }
}

/// Build the SET clause for an optional attribute.
fn optional_assignment(property: &str, present: bool) -> String {
    if present {
        format!("n.{property} = ${property}")
    } else {
        format!("n.{property} = null")
    }
}

#[async_trait]
impl GraphTxn for Neo4jTxn {
    async fn find_entity(&mut self, kind: EntityKind, path: &str) -> Result<Option<StoredState>> {
        let query = Query::new(format!(
            "MATCH (n:{} {{path: $path}})
             RETURN n.version AS version, n.status AS status
             LIMIT 1",
            kind.label()
        ))
        .param("path", path);

        let rows = self.rows(query).await?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };

        let version = row.get::<Option<i64>>("version").ok().flatten().unwrap_or(0);
        let status = row
            .get::<Option<String>>("status")
            .ok()
            .flatten()
            .and_then(|s| EntityStatus::from_str(&s));

        Ok(Some(StoredState { version, status }))
    }

    async fn write_entity(&mut self, entity: &Entity) -> Result<()> {
        let payload = &entity.payload;
        let assignments = [
            optional_assignment("old_status", entity.old_status.is_some()),
            optional_assignment("line_number", payload.line_number.is_some()),
            optional_assignment("content_hash", payload.content_hash.is_some()),
        ]
        .join(",\n                 ");

        let mut query = Query::new(format!(
            "MERGE (n:{} {{path: $path}})
             SET n.name = $name,
                 n.language = $language,
                 n.status = $status,
                 n.revision = $revision,
                 n.last_updated = $last_updated,
                 n.version = $version,
                 n.code = $code,
                 n.size = $size,
                 n.lines = $lines,
                 {assignments}",
            entity.kind.label()
        ))
        .param("path", entity.path.as_str())
        .param("name", entity.name.as_str())
        .param("language", entity.language.name())
        .param("status", entity.status.as_str())
        .param("revision", entity.revision.as_str())
        .param("last_updated", entity.last_updated.as_str())
        .param("version", entity.version)
        .param("code", payload.code.as_str())
        .param("size", payload.size)
        .param("lines", payload.lines);

        if let Some(old_status) = entity.old_status {
            query = query.param("old_status", old_status.as_str());
        }
        if let Some(line_number) = payload.line_number {
            query = query.param("line_number", line_number);
        }
        if let Some(hash) = &payload.content_hash {
            query = query.param("content_hash", hash.as_str());
        }

        self.txn.run(query).await.context("Failed to write entity")?;
        debug!(kind = %entity.kind, path = %entity.path, version = entity.version, "Wrote entity");
        Ok(())
    }

    async fn merge_relation(
        &mut self,
        relation: &Relation,
        contained_kind: EntityKind,
        contained_path: &str,
        created_at: &str,
    ) -> Result<bool> {
        let query = Query::new(format!(
            "MATCH (a:{} {{path: $container}})
             MATCH (b:{} {{path: $contained}})
             MERGE (a)-[r:{}]->(b)
             ON CREATE SET r.created_at = $created_at
             RETURN count(r) AS linked",
            relation.container_kind.label(),
            contained_kind.label(),
            relation.kind.rel_type()
        ))
        .param("container", relation.container_path.as_str())
        .param("contained", contained_path)
        .param("created_at", created_at);

        Ok(self.count(query, "linked").await? > 0)
    }

    async fn mark_file_deleted(&mut self, file_path: &str, revision: &str, timestamp: &str) -> Result<usize> {
        let query = Query::new(format!(
            "MATCH (n) WHERE {}
               AND (n.path = $file OR n.path STARTS WITH $prefix)
               AND n.status <> $deleted
             SET n.old_status = n.status,
                 n.status = $deleted,
                 n.revision = $revision,
                 n.last_updated = $timestamp
             RETURN count(n) AS flipped",
            entity_label_predicate("n")
        ))
        .param("file", file_path)
        .param("prefix", format!("{file_path}:"))
        .param("deleted", EntityStatus::Deleted.as_str())
        .param("revision", revision)
        .param("timestamp", timestamp);

        self.count(query, "flipped").await
    }

    async fn create_snapshot(&mut self, revision: &str, timestamp: &str) -> Result<usize> {
        let marker = Query::new(format!(
            "MERGE (s:{SNAPSHOT_LABEL} {{revision: $revision}})
             ON CREATE SET s.timestamp = $timestamp"
        ))
        .param("revision", revision)
        .param("timestamp", timestamp);
        self.txn.run(marker).await.context("Failed to create snapshot marker")?;

        let tag = Query::new(format!(
            "MATCH (n) WHERE {} AND n.status = $active
             SET n.snapshot_revision = $revision
             RETURN count(n) AS tagged",
            entity_label_predicate("n")
        ))
        .param("active", EntityStatus::Active.as_str())
        .param("revision", revision);

        self.count(tag, "tagged").await
    }

    async fn snapshot_exists(&mut self, revision: &str) -> Result<bool> {
        let query = Query::new(format!(
            "MATCH (s:{SNAPSHOT_LABEL} {{revision: $revision}}) RETURN count(s) AS found"
        ))
        .param("revision", revision);

        Ok(self.count(query, "found").await? > 0)
    }

    async fn mark_revision_processed(&mut self, revision: &str, timestamp: &str) -> Result<()> {
        let query = Query::new(format!(
            "MERGE (p:{PROCESSED_LABEL} {{revision: $revision}})
             ON CREATE SET p.processed_at = $timestamp"
        ))
        .param("revision", revision)
        .param("timestamp", timestamp);

        self.txn.run(query).await.context("Failed to mark revision processed")?;
        Ok(())
    }

    async fn mark_rolled_back_except(&mut self, revision: &str) -> Result<usize> {
        let query = Query::new(format!(
            "MATCH (n) WHERE {}
               AND (n.revision IS NULL OR n.revision <> $revision)
               AND n.status = $active
             SET n.old_status = n.status, n.status = $rolled_back
             RETURN count(n) AS flipped",
            entity_label_predicate("n")
        ))
        .param("revision", revision)
        .param("active", EntityStatus::Active.as_str())
        .param("rolled_back", EntityStatus::RolledBack.as_str());

        self.count(query, "flipped").await
    }

    async fn reactivate_snapshot(&mut self, revision: &str) -> Result<usize> {
        let query = Query::new(format!(
            "MATCH (n) WHERE {}
               AND (n.snapshot_revision = $revision OR n.revision = $revision)
               AND n.status = $rolled_back
             SET n.old_status = n.status, n.status = $active
             RETURN count(n) AS flipped",
            entity_label_predicate("n")
        ))
        .param("revision", revision)
        .param("active", EntityStatus::Active.as_str())
        .param("rolled_back", EntityStatus::RolledBack.as_str());

        self.count(query, "flipped").await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.txn.commit().await.context("Failed to commit Neo4j transaction")
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.txn.rollback().await.context("Failed to roll back Neo4j transaction")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_assignment() {
        assert_eq!(optional_assignment("old_status", true), "n.old_status = $old_status");
        assert_eq!(optional_assignment("line_number", false), "n.line_number = null");
    }
}
