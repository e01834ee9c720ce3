//! Error types for core values and chat backends.

use thiserror::Error;

/// Errors raised when constructing core values.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The time window ends before it starts.
    #[error("invalid time window: start {start} is after end {end}")]
    InvalidWindow { start: String, end: String },

    /// The window length could not be represented.
    #[error("invalid window length: {0} hours")]
    InvalidHours(i64),
}

/// Errors that can occur while talking to a chat backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend configuration is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network or transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response could not be interpreted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The backend is not available (e.g. model not loaded).
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}
