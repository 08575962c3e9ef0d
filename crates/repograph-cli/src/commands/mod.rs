//! CLI command definitions and handlers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use repograph_core::SyncConfig;
use repograph_github::GitHubClient;
use repograph_graph::{GraphClient, GraphStore, Neo4jStore};

pub mod graph;
pub mod reconcile;
pub mod serve;

/// Repograph - repository structure mirrored into Neo4j
#[derive(Parser)]
#[command(name = "repograph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to ./repograph.toml when present)
    #[arg(short, long, global = true, env = "REPOGRAPH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve push events and control endpoints, and run the reconciliation loop
    Serve(serve::ServeArgs),

    /// Run one reconciliation pass against recent history
    Reconcile(reconcile::ReconcileArgs),

    /// Roll the graph back to a revision's snapshot
    Rollback {
        /// Revision identifier with a recorded snapshot
        revision: String,
    },

    /// Show graph health and counts
    Status,

    /// Create constraints and indexes
    Schema,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = SyncConfig::load(self.config.as_deref())?;

        match self.command {
            Commands::Serve(args) => serve::execute(args, config).await,
            Commands::Reconcile(args) => reconcile::execute(args, config).await,
            Commands::Rollback { revision } => graph::cmd_rollback(&config, &revision).await,
            Commands::Status => graph::cmd_status(&config).await,
            Commands::Schema => graph::cmd_schema(&config).await,
        }
    }
}

/// Connect to Neo4j and wrap the client as a graph store.
pub async fn connect_store(config: &SyncConfig) -> Result<(GraphClient, Arc<dyn GraphStore>)> {
    let client = GraphClient::connect(&config.neo4j).await?;
    let store: Arc<dyn GraphStore> = Arc::new(Neo4jStore::new(client.clone()));
    Ok((client, store))
}

pub fn github_host(config: &SyncConfig) -> Result<Arc<GitHubClient>> {
    Ok(Arc::new(GitHubClient::new(&config.github)?))
}
