//! Operator control endpoints: rollback and health.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn rollback(
    State(state): State<AppState>,
    Path(revision): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let report = state.pipeline.rollback(&revision).await?;
    info!(revision = %revision, rolled_back = report.rolled_back, reactivated = report.reactivated, "Rollback completed");

    Ok(Json(json!({
        "status": "success",
        "rolled_back_to": report.revision,
        "rolled_back": report.rolled_back,
        "reactivated": report.reactivated,
    })))
}

/// Graph health. Store failures are reported in the body, not as an HTTP error.
pub async fn graph_health(State(state): State<AppState>) -> Json<Value> {
    match state.pipeline.health().await {
        Ok(health) => Json(json!({
            "status": "healthy",
            "active_nodes": health.active_nodes,
            "last_commit": health.last_commit,
            "last_updated": health.last_updated,
        })),
        Err(e) => {
            error!(error = %e, "Health check failed");
            Json(json!({ "status": "unhealthy", "error": e.to_string() }))
        }
    }
}

/// Liveness probe.
pub async fn liveness(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "repository": state.repository,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
