//! Static backend - answers with fixed text.

use std::sync::Arc;

use report_core::{async_trait, BackendError, ChatBackend, ChatRequest};
use tokio::sync::Mutex;

/// A backend that answers every request with the same text.
///
/// Requests are recorded so tests can inspect the messages that were sent.
/// Clones share the same recording.
#[derive(Debug, Clone)]
pub struct StaticBackend {
    reply: String,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl StaticBackend {
    /// Create a new StaticBackend with the given reply.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// All requests received so far, in order.
    pub async fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of requests received so far.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl ChatBackend for StaticBackend {
    async fn complete(&self, request: ChatRequest) -> Result<String, BackendError> {
        self.requests.lock().await.push(request);
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "StaticBackend"
    }
}
