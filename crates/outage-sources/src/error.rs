//! Error types for source fetches.
//!
//! These never leave the clients' public fetch methods; they exist so the
//! absorbed failure can be logged with its cause.

use thiserror::Error;

/// Errors that can occur while fetching from a data source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No HTTP client could be built.
    #[error("transport disabled")]
    Disabled,

    /// No credential configured for a source that needs one.
    #[error("missing credential")]
    MissingCredential,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-200 response.
    #[error("unexpected status {0}")]
    Status(u16),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
