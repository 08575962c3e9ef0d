//! Centralized error types for Repograph.

use thiserror::Error;

/// Main error type for Repograph operations.
#[derive(Error, Debug)]
pub enum RepographError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Missing signature header")]
    MissingSignature,

    #[error("Failed to fetch '{path}': {reason}")]
    Fetch { path: String, reason: String },

    #[error("Cannot resolve relation endpoint {label} '{path}'")]
    RelationResolution { label: String, path: String },

    #[error("Graph transaction for revision '{revision}' failed: {reason}")]
    Transaction { revision: String, reason: String },

    #[error("No snapshot recorded for revision '{0}'")]
    RollbackNotFound(String),

    #[error("Rollback is disabled")]
    RollbackDisabled,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Graph store error: {0}")]
    Graph(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for Repograph operations.
pub type RepographResult<T> = Result<T, RepographError>;

impl RepographError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a transaction error for a revision.
    pub fn transaction(revision: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Transaction {
            revision: revision.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a graph store error from any displayable cause.
    pub fn graph(cause: impl std::fmt::Display) -> Self {
        Self::Graph(format!("{:#}", cause))
    }
}
