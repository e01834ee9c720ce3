//! The ChatBackend trait definition.

use async_trait::async_trait;

use crate::error::BackendError;
use crate::message::ChatRequest;

/// A trait for LLM backends that answer chat completion requests.
///
/// Implementations range from remote OpenAI-compatible services to models
/// running in-process. This trait is object-safe and can be shared as
/// `Arc<dyn ChatBackend>`.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run a chat completion and return the text of the first choice.
    ///
    /// An empty or missing first choice is reported as
    /// [`BackendError::MalformedResponse`].
    async fn complete(&self, request: ChatRequest) -> Result<String, BackendError>;

    /// Get a human-readable name for this backend.
    fn name(&self) -> &str;
}
