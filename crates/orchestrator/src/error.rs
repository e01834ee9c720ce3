//! Error types for the report pipeline.

use std::path::PathBuf;

use report_core::CoreError;
use report_synth::SynthError;
use thiserror::Error;

/// Errors that can occur while setting up or persisting a report.
///
/// Producing the report text itself never fails.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Config file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Config file is not valid YAML for [`crate::ReporterConfig`].
    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// Synthesizer could not be constructed.
    #[error(transparent)]
    Synth(#[from] SynthError),

    /// Invalid reporting window.
    #[error(transparent)]
    Window(#[from] CoreError),

    /// Writing the report failed.
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    /// Reading or writing the MCP stdio stream failed.
    #[error("MCP transport error: {0}")]
    Transport(std::io::Error),

    /// An MCP response could not be encoded.
    #[error("failed to encode MCP response: {0}")]
    Encode(#[from] serde_json::Error),
}
