//! OpenAI-compatible chat completion backend.
//!
//! This crate provides a [`ChatBackend`] that talks to any service exposing
//! the OpenAI `/chat/completions` endpoint: OpenAI itself, Ollama's `/v1`
//! shim, vLLM, llama.cpp server, and similar self-hosted gateways.
//!
//! # Features
//!
//! - Bearer credential is optional (many self-hosted backends accept none)
//! - Multimodal user messages (inline base64 PNG data URIs)
//! - Bounded request timeout
//!
//! # Usage
//!
//! ```rust,no_run
//! use openai_backend::{OpenAiBackend, OpenAiBackendConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OpenAiBackendConfig::builder()
//!         .api_url("http://localhost:11434/v1")
//!         .build();
//!     let backend = OpenAiBackend::new(config)?;
//!     // Share as Arc<dyn ChatBackend>...
//!     Ok(())
//! }
//! ```

mod api_types;
mod backend;
mod config;

pub use backend::OpenAiBackend;
pub use config::{OpenAiBackendConfig, OpenAiBackendConfigBuilder, DEFAULT_API_URL, OLLAMA_API_URL};

// Re-export report-core types for convenience
pub use report_core::{async_trait, BackendError, ChatBackend, ChatMessage, ChatRequest};
