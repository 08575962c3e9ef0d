//! # Repograph GitHub
//!
//! GitHub implementation of the `SourceHost` collaborator: file contents and
//! recursive trees over the REST API, branch history over GraphQL.

pub mod api;
pub mod client;

pub use client::{GitHubClient, DEFAULT_USER_AGENT};
