//! Error responses for HTTP handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use repograph_core::RepographError;

/// A handler error, rendered as `{"status": "error", "error": ...}`.
#[derive(Debug)]
pub struct ApiError(pub RepographError);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            RepographError::Authentication(_) => StatusCode::UNAUTHORIZED,
            RepographError::MissingSignature => StatusCode::BAD_REQUEST,
            RepographError::InvalidPayload(_) | RepographError::Json(_) => StatusCode::BAD_REQUEST,
            RepographError::RollbackNotFound(_) => StatusCode::NOT_FOUND,
            RepographError::RollbackDisabled => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepographError> for ApiError {
    fn from(err: RepographError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self.0, "Request rejected");
        }

        let body = Json(json!({ "status": "error", "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (RepographError::Authentication("bad".into()), StatusCode::UNAUTHORIZED),
            (RepographError::MissingSignature, StatusCode::BAD_REQUEST),
            (RepographError::RollbackNotFound("r9".into()), StatusCode::NOT_FOUND),
            (RepographError::RollbackDisabled, StatusCode::CONFLICT),
            (RepographError::transaction("r1", "boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status_code(), expected);
        }
    }
}
