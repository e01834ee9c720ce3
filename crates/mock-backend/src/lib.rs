//! Mock chat backends for report synthesis tests.
//!
//! This crate provides mock implementations of the `ChatBackend` trait:
//! - `StaticBackend` - Answers every request with fixed text and records requests
//! - `FailingBackend` - Fails every request with a chosen error
//! - `FlakyBackend` - Fails the first N requests, then answers
//! - `SlowBackend` - Answers only after a fixed latency
//!
//! For real completions, use the `openai-backend` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_backend::{ChatBackend, ChatMessage, ChatRequest, StaticBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_backend::BackendError> {
//!     let backend = StaticBackend::new("Outage confirmed.");
//!
//!     let request = ChatRequest {
//!         model: "test".to_string(),
//!         messages: vec![ChatMessage::user("What happened?")],
//!         temperature: None,
//!         max_tokens: None,
//!     };
//!
//!     let text = backend.complete(request).await?;
//!     assert_eq!(text, "Outage confirmed.");
//!     Ok(())
//! }
//! ```

mod failing;
mod fixed;
mod slow;

// Re-export report-core types for convenience
pub use report_core::{
    async_trait, BackendError, ChatBackend, ChatMessage, ChatRequest, ContentPart, MessageContent,
};

pub use failing::{FailingBackend, FailureKind, FlakyBackend};
pub use fixed::StaticBackend;
pub use slow::SlowBackend;
