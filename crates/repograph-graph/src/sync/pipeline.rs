//! Push-event and full-resync entry points of the sync pipeline.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use repograph_core::config::SyncSettings;
use repograph_core::{
    ChangeCollector, ChangeSet, Extractor, PushEvent, RepographError, RepographResult, RevisionInfo,
    SourceHost,
};

use super::{RollbackReport, SnapshotManager, SyncResult, UpsertEngine};
use crate::store::{GraphHealth, GraphStore};

/// Response to an inbound push event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum PushOutcome {
    /// Subscription ping.
    #[serde(rename = "ignored")]
    Ignored,
    #[serde(rename = "not a push event")]
    NotAPush,
    #[serde(rename = "no changes detected")]
    NoChanges,
    #[serde(rename = "processed")]
    Processed {
        commit: String,
        entities_processed: usize,
        files_processed: usize,
        files_added: usize,
        files_modified: usize,
        files_removed: usize,
    },
}

/// Collection, extraction and graph mutation wired together.
///
/// Shared by the push endpoint and the reconciler; every call is an
/// independent unit of work.
#[derive(Clone)]
pub struct SyncPipeline {
    store: Arc<dyn GraphStore>,
    collector: ChangeCollector,
    extractor: Extractor,
    engine: UpsertEngine,
    snapshots: SnapshotManager,
    diff_analysis: bool,
    full_resync_max_files: usize,
    fetch_timeout: Duration,
}

impl SyncPipeline {
    pub fn new(store: Arc<dyn GraphStore>, host: Arc<dyn SourceHost>, settings: &SyncSettings) -> Self {
        Self {
            collector: ChangeCollector::new(host, settings.collector_settings()),
            extractor: Extractor::new(settings.code_excerpt_limit),
            engine: UpsertEngine::new(store.clone(), settings.enable_rollback),
            snapshots: SnapshotManager::new(store.clone(), settings.enable_rollback),
            store,
            diff_analysis: settings.enable_diff_analysis,
            full_resync_max_files: settings.full_resync_max_files,
            fetch_timeout: Duration::from_secs(settings.fetch_timeout_secs),
        }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    pub fn host(&self) -> &Arc<dyn SourceHost> {
        self.collector.host()
    }

    pub fn snapshots(&self) -> &SnapshotManager {
        &self.snapshots
    }

    /// Bound on a single history or fetch call.
    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Handle one push event end to end.
    pub async fn handle_push(&self, event: &PushEvent) -> RepographResult<PushOutcome> {
        if event.is_ping() {
            debug!("Ignoring ping delivery");
            return Ok(PushOutcome::Ignored);
        }
        if event.commits.is_none() {
            return Ok(PushOutcome::NotAPush);
        }

        let info = event
            .revision_info()
            .ok_or_else(|| RepographError::InvalidPayload("push event has no 'after' revision".into()))?;

        let changes = ChangeSet::from_event(event);
        if changes.is_empty() {
            info!(revision = %info.revision, "Push carries no file changes");
            return Ok(PushOutcome::NoChanges);
        }

        info!(
            revision = %info.revision,
            added = changes.added.len(),
            modified = changes.modified.len(),
            removed = changes.removed.len(),
            "Processing push"
        );

        let files = if self.diff_analysis {
            self.collector
                .fetch_files(&info.revision, &changes.changed_paths())
                .await
        } else {
            self.collector
                .fetch_repository(&info.revision, self.full_resync_max_files)
                .await?
        };

        let timestamp = Utc::now().to_rfc3339();
        let entities = self.extractor.extract_all(&files, &info.revision, &timestamp);
        let removed: Vec<String> = changes.removed.iter().cloned().collect();

        let result = self.engine.apply_revision(&info, entities, &removed).await?;

        Ok(PushOutcome::Processed {
            commit: info.revision,
            entities_processed: result.entities_processed(),
            files_processed: files.len(),
            files_added: changes.added.len(),
            files_modified: changes.modified.len(),
            files_removed: changes.removed.len(),
        })
    }

    /// Re-read the whole tree at `info.revision` and apply it.
    pub async fn sync_revision(&self, info: &RevisionInfo, max_files: usize) -> RepographResult<SyncResult> {
        let files = self
            .collector
            .fetch_repository(&info.revision, max_files)
            .await?;

        let timestamp = Utc::now().to_rfc3339();
        let entities = self.extractor.extract_all(&files, &info.revision, &timestamp);
        debug!(revision = %info.revision, files = files.len(), entities = entities.len(), "Extracted revision");

        self.engine.apply_revision(info, entities, &[]).await
    }

    pub async fn revision_processed(&self, revision: &str) -> RepographResult<bool> {
        self.store
            .revision_processed(revision)
            .await
            .map_err(RepographError::graph)
    }

    pub async fn rollback(&self, revision: &str) -> RepographResult<RollbackReport> {
        self.snapshots.rollback(revision).await
    }

    pub async fn health(&self) -> RepographResult<GraphHealth> {
        self.store.health().await.map_err(RepographError::graph)
    }
}
