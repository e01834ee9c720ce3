//! Slow backend - answers only after a fixed latency.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use report_core::{async_trait, BackendError, ChatBackend, ChatRequest};

/// A backend that takes `latency` to produce a fixed reply.
///
/// Pair with a short request timeout to exercise the fallback path. A call
/// abandoned by the caller's timeout is never counted as completed.
#[derive(Debug, Clone)]
pub struct SlowBackend {
    reply: String,
    latency: Duration,
    completed: Arc<AtomicUsize>,
}

impl SlowBackend {
    pub fn new(reply: impl Into<String>, latency: Duration) -> Self {
        Self {
            reply: reply.into(),
            latency,
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of calls that ran to completion.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for SlowBackend {
    async fn complete(&self, _request: ChatRequest) -> Result<String, BackendError> {
        tokio::time::sleep(self.latency).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "SlowBackend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_core::ChatMessage;

    fn request() -> ChatRequest {
        ChatRequest {
            model: "test".to_string(),
            messages: vec![ChatMessage::user("status?")],
            temperature: None,
            max_tokens: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_answers_after_latency() {
        let backend = SlowBackend::new("late", Duration::from_secs(30));
        let started = tokio::time::Instant::now();

        let text = backend.complete(request()).await.unwrap();

        assert_eq!(text, "late");
        assert!(started.elapsed() >= Duration::from_secs(30));
        assert_eq!(backend.completed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_call_not_completed() {
        let backend = SlowBackend::new("late", Duration::from_secs(30));

        let outcome =
            tokio::time::timeout(Duration::from_secs(1), backend.complete(request())).await;

        assert!(outcome.is_err());
        assert_eq!(backend.completed(), 0);
    }
}
