//! Core types and traits shared by the outage reporter crates.
//!
//! This crate defines:
//!
//! - [`TimeWindow`], [`OutageData`], [`NewsArticle`] - the values flowing from
//!   the fetch clients into the report synthesizer
//! - [`ChatBackend`] - the trait every LLM backend implements
//! - [`ChatRequest`] / [`ChatMessage`] / [`ContentPart`] - the chat-completion
//!   message shape shared by remote and in-process backends
//! - [`PromptTemplate`] - the report prompt with its named placeholders
//!
//! # Example
//!
//! ```rust
//! use report_core::{async_trait, BackendError, ChatBackend, ChatRequest};
//!
//! struct Canned;
//!
//! #[async_trait]
//! impl ChatBackend for Canned {
//!     async fn complete(&self, _request: ChatRequest) -> Result<String, BackendError> {
//!         Ok("All clear.".to_string())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Canned"
//!     }
//! }
//! ```

mod article;
mod backend;
mod error;
mod message;
mod prompt;
mod window;

pub use article::{ArticleSource, NewsArticle, OutageData};
pub use backend::ChatBackend;
pub use error::{BackendError, CoreError};
pub use message::{ChatMessage, ChatRequest, ContentPart, ImageUrl, MessageContent};
pub use prompt::{hash_prompt, PromptContext, PromptTemplate, DEFAULT_REPORT_PROMPT};
pub use window::TimeWindow;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
