//! One-shot reconciliation command.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use repograph_core::SyncConfig;
use repograph_graph::{GraphStore, MemoryGraph, Reconciler, SyncPipeline};

use crate::output;

#[derive(Args)]
pub struct ReconcileArgs {
    /// Revisions of history to examine (capped by sync.max_history_versions)
    #[arg(long)]
    pub depth: Option<usize>,

    /// Maximum files loaded per revision
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Apply to an in-memory graph instead of Neo4j
    #[arg(long)]
    pub dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: ReconcileArgs, config: SyncConfig) -> Result<()> {
    config.validate()?;

    let store: Arc<dyn GraphStore> = if args.dry_run {
        Arc::new(MemoryGraph::new())
    } else {
        super::connect_store(&config).await?.1
    };

    let depth = args
        .depth
        .map(|d| d.min(config.sync.max_history_versions))
        .unwrap_or_else(|| config.sync.effective_history_depth());
    let max_files = args.max_files.unwrap_or(config.sync.reconcile_max_files);

    let github = super::github_host(&config)?;
    let pipeline = SyncPipeline::new(store, github, &config.sync);
    let reconciler = Reconciler::new(pipeline, depth, max_files, config.sync.reconcile_interval());

    if !args.json {
        let mode = if args.dry_run { " (dry run)" } else { "" };
        println!("{}{}", "Reconciling recent history...".bold(), mode.dimmed());
    }

    let report = reconciler.run_pass().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_reconcile_report(&report);
    }
    Ok(())
}
