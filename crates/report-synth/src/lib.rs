//! Outage report synthesis.
//!
//! This crate provides the [`ReportSynthesizer`], which turns outage data,
//! news articles, an optional visualization link and an optional image into
//! a plain-text report.
//!
//! # Architecture
//!
//! ```text
//!   RendererConfig ──► ReportSynthesizer::new
//!                        │
//!                        ├─ use_llm = false / provider none ──► Local (permanent)
//!                        ├─ OpenAI-compatible client built ───► Llm(remote)
//!                        ├─ in-process GGUF model loaded ─────► Llm(in-process)
//!                        └─ unknown provider / build failed ──► Local (sticky)
//!
//!   generate_report
//!     ├─ Local ──────────────────────────────► render_local
//!     └─ Llm ─► chat completion (bounded) ─ok─► model text
//!                         └─ error/timeout ───► render_local (this call only)
//! ```
//!
//! The only construction-time failure surfaced to the caller is selecting
//! the in-process provider without a model path.

mod config;
mod error;
mod gguf;
mod local;
mod local_model;
mod synthesizer;

pub use config::{ProviderKind, ProviderSettings, RendererConfig};
pub use error::SynthError;
pub use local::{
    render_local, summarize_outage, ANALYSIS_TEXT, MAX_RENDERED_ARTICLES, NO_ARTICLES,
    NO_OUTAGE_DATA, OUTAGE_DATA_LIMIT, TRUNCATION_MARKER,
};
pub use gguf::GgufBackend;
pub use local_model::{GgufLoader, ModelLoader, DEFAULT_TOKENIZER_FILE};
pub use synthesizer::{RenderMode, ReportSynthesizer, SYSTEM_INSTRUCTION};

// Re-export report-core types for convenience
pub use report_core::{ChatBackend, NewsArticle, OutageData, PromptTemplate};
