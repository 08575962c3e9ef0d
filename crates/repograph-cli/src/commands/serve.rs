//! Web server command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tokio::sync::watch;
use tracing::{info, warn};

use repograph_core::SyncConfig;
use repograph_graph::{schema, Reconciler, SyncPipeline};
use repograph_web::AppState;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides server.port)
    #[arg(long)]
    pub port: Option<u16>,

    /// Host to bind to (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Also append logs to this file
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Do not start the periodic reconciliation loop
    #[arg(long)]
    pub no_reconcile: bool,
}

pub async fn execute(args: ServeArgs, config: SyncConfig) -> Result<()> {
    config.validate()?;
    let secret = config.webhook_secret()?.to_string();

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);

    let (client, store) = super::connect_store(&config).await?;
    schema::initialize_schema(&client).await?;

    let github = super::github_host(&config)?;
    let repository = github.repository();
    let pipeline = SyncPipeline::new(store, github, &config.sync);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let reconcile_task = if args.no_reconcile {
        None
    } else {
        let reconciler = Reconciler::new(
            pipeline.clone(),
            config.sync.effective_history_depth(),
            config.sync.reconcile_max_files,
            config.sync.reconcile_interval(),
        );
        Some(tokio::spawn(async move { reconciler.run(shutdown_rx).await }))
    };

    println!();
    println!("  {} {}", "Repograph".cyan().bold(), repository.bold());
    println!();
    println!("  {}      http://{}:{}/webhook", "Webhook".green(), host, port);
    println!("  {}       http://{}:{}/graph/health", "Health".green(), host, port);
    println!(
        "  {}    every {}s",
        "Reconcile".green(),
        config.sync.reconcile_interval_secs
    );
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    let state = AppState::new(Arc::new(pipeline), &secret, repository);
    let shutdown = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Shutdown requested");
        let _ = shutdown_tx.send(true);
    };

    repograph_web::run_server(state, &host, port, shutdown).await?;

    // An in-flight reconciliation pass finishes before the loop exits.
    if let Some(task) = reconcile_task {
        if let Err(e) = task.await {
            warn!(error = %e, "Reconciliation task ended abnormally");
        }
    }

    Ok(())
}
