//! Error types for report synthesis.

use thiserror::Error;

/// Errors that can occur while constructing a synthesizer.
///
/// Report generation itself never fails.
#[derive(Debug, Error)]
pub enum SynthError {
    /// Configuration is unusable (e.g. in-process provider without a model path).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Provider name not recognised.
    #[error("unknown LLM provider: {0}")]
    UnknownProvider(String),
}
