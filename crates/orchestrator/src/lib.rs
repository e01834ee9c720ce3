//! Outage report pipeline.
//!
//! This crate provides the [`Coordinator`], which fetches outage signals and
//! news for a location and hands them to the report synthesizer, together
//! with the layered [`ReporterConfig`] and helpers for saving reports. The
//! [`mcp`] module serves the outage sources to MCP clients over stdio.
//!
//! # Architecture
//!
//! ```text
//! ReporterConfig (defaults ◄ YAML ◄ env)
//!          ↓
//! ┌──────────────────────────────────────────────────────┐
//! │                     COORDINATOR                      │
//! │                                                      │
//! │  1. Fetch outage signals (IODA, 10s, absent on fail) │
//! │         ↓                                            │
//! │  2. Build visualization link                         │
//! │         ↓                                            │
//! │  3. Search news (NewsAPI, 10s, empty on fail)        │
//! │         ↓                                            │
//! │  4. Synthesize report (LLM or local renderer)        │
//! └──────────────────────────────────────────────────────┘
//!          ↓
//! report text ──► save_report / HTTP response
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use orchestrator::{Coordinator, PromptTemplate, ReporterConfig, TimeWindow};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReporterConfig::load(None)?;
//!     let coordinator = Coordinator::from_config(&config, PromptTemplate::default())?;
//!
//!     let window = TimeWindow::last_hours(config.default_window_hours)?;
//!     let report = coordinator.run(&config.default_location, &window).await;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

mod config;
mod coordinator;
mod error;
pub mod mcp;
mod output;

pub use config::{ReporterConfig, DEFAULT_CONFIG_PATH, DEFAULT_PROMPT_PATH};
pub use coordinator::Coordinator;
pub use error::OrchestratorError;
pub use mcp::McpServer;
pub use output::{report_file_name, save_report, save_window_report, DEFAULT_OUTPUT_DIR};

// Re-export commonly used types from dependencies
pub use report_core::{CoreError, NewsArticle, PromptTemplate, TimeWindow};
pub use report_synth::{RenderMode, ReportSynthesizer};
