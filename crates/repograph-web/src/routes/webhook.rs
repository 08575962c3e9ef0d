//! Push-event endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use tracing::{debug, info};

use repograph_core::{PushEvent, RepographError};
use repograph_graph::PushOutcome;

use crate::error::ApiError;
use crate::signature::{verify_signature, SIGNATURE_HEADER};
use crate::state::AppState;

/// Verify, parse and apply one push delivery.
///
/// The signature is checked over the raw body before anything is parsed.
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PushOutcome>, ApiError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    verify_signature(&state.secret, signature, &body)?;

    let delivery = headers
        .get("x-github-delivery")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    debug!(delivery, bytes = body.len(), "Push delivery authenticated");

    let event: PushEvent = serde_json::from_slice(&body)
        .map_err(|e| RepographError::InvalidPayload(e.to_string()))?;

    let outcome = state.pipeline.handle_push(&event).await?;
    info!(delivery, outcome = ?outcome, "Push delivery handled");
    Ok(Json(outcome))
}
