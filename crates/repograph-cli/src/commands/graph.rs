//! Graph maintenance commands: rollback, status, schema.

use anyhow::Result;
use colored::Colorize;

use repograph_core::SyncConfig;
use repograph_graph::{schema, GraphStore, SnapshotManager};

use crate::output;

/// Roll the graph back to a revision's snapshot.
pub async fn cmd_rollback(config: &SyncConfig, revision: &str) -> Result<()> {
    let (_client, store) = super::connect_store(config).await?;
    let manager = SnapshotManager::new(store, config.sync.enable_rollback);

    println!("{} {}", "Rolling back to".bold(), revision.yellow());
    let report = manager.rollback(revision).await?;

    println!("\n{}", "Rollback complete:".green().bold());
    println!("  Rolled back: {}", report.rolled_back);
    println!("  Reactivated: {}", report.reactivated);
    Ok(())
}

/// Show graph health and node/relationship counts.
pub async fn cmd_status(config: &SyncConfig) -> Result<()> {
    let (client, store) = super::connect_store(config).await?;

    let health = store.health().await?;
    let counts = client.get_counts().await?;

    output::print_status(&config.neo4j.uri, &health, &counts);
    Ok(())
}

/// Create constraints and indexes.
pub async fn cmd_schema(config: &SyncConfig) -> Result<()> {
    let (client, _store) = super::connect_store(config).await?;
    schema::initialize_schema(&client).await?;

    println!("{}", "Schema initialized.".green().bold());
    for statement in schema::schema_statements() {
        println!("  {}", statement.dimmed());
    }
    Ok(())
}
