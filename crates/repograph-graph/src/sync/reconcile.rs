//! Periodic reconciliation against branch history.
//!
//! Each pass fetches the most recent revisions and replays, oldest first, every
//! one the graph has not recorded as processed. That record is the only
//! de-duplication against the push path.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use repograph_core::{RepographError, RepographResult};

use super::{SyncPipeline, SyncResult};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub examined: usize,
    pub processed: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub totals: SyncResult,
}

/// Replays missed revisions on a fixed schedule.
#[derive(Clone)]
pub struct Reconciler {
    pipeline: SyncPipeline,
    depth: usize,
    max_files: usize,
    interval: Duration,
}

impl Reconciler {
    pub fn new(pipeline: SyncPipeline, depth: usize, max_files: usize, interval: Duration) -> Self {
        Self {
            pipeline,
            depth,
            max_files,
            interval,
        }
    }

    /// Run one pass. Only a failure to read history fails the pass.
    pub async fn run_pass(&self) -> RepographResult<ReconcileReport> {
        let host = self.pipeline.host().clone();
        let history = tokio::time::timeout(self.pipeline.fetch_timeout(), host.recent_history(self.depth))
            .await
            .map_err(|_| RepographError::Fetch {
                path: "history".to_string(),
                reason: "timed out".to_string(),
            })?
            .map_err(|e| RepographError::Fetch {
                path: "history".to_string(),
                reason: format!("{e:#}"),
            })?;

        let mut report = ReconcileReport {
            examined: history.len(),
            ..ReconcileReport::default()
        };

        for info in history.iter().rev() {
            let revision = info.revision.as_str();

            match self.pipeline.revision_processed(revision).await {
                Ok(true) => {
                    debug!(revision, "Revision already in graph");
                    report.skipped.push(revision.to_string());
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    error!(revision, error = %e, "Cannot check revision");
                    report.failed.push((revision.to_string(), e.to_string()));
                    continue;
                }
            }

            match self.pipeline.sync_revision(info, self.max_files).await {
                Ok(result) => {
                    info!(revision, entities = result.entities_processed(), "Reconciled revision");
                    report.totals.merge(&result);
                    report.processed.push(revision.to_string());
                }
                Err(e) => {
                    error!(revision, error = %e, "Reconciliation failed for revision");
                    report.failed.push((revision.to_string(), e.to_string()));
                }
            }
        }

        info!(
            examined = report.examined,
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Reconciliation pass complete"
        );
        Ok(report)
    }

    /// Run passes until `shutdown` flips to true. The first pass starts immediately.
    ///
    /// Shutdown is only observed between passes; a started pass runs to completion.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_secs = self.interval.as_secs(), depth = self.depth, "Reconciliation loop started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_pass().await {
                        warn!(error = %e, "Reconciliation pass aborted");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Reconciliation loop stopped");
    }
}
