//! Failing backends - simulate transient LLM failures.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use report_core::{async_trait, BackendError, ChatBackend, ChatRequest};

/// Which failure a mock backend reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Timeout,
    ServerError,
    Malformed,
}

impl FailureKind {
    fn to_error(self) -> BackendError {
        match self {
            FailureKind::Network => BackendError::Network("connection refused".to_string()),
            FailureKind::Timeout => BackendError::Timeout,
            FailureKind::ServerError => BackendError::Api {
                status: 500,
                message: "internal error".to_string(),
            },
            FailureKind::Malformed => {
                BackendError::MalformedResponse("no choices in response".to_string())
            }
        }
    }
}

/// A backend whose every call fails.
#[derive(Debug, Clone)]
pub struct FailingBackend {
    kind: FailureKind,
    calls: Arc<AtomicUsize>,
}

impl FailingBackend {
    pub fn new(kind: FailureKind) -> Self {
        Self {
            kind,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of calls attempted so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for FailingBackend {
    async fn complete(&self, _request: ChatRequest) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.kind.to_error())
    }

    fn name(&self) -> &str {
        "FailingBackend"
    }
}

/// A backend that fails the first `failures` calls and then answers.
///
/// Useful for checking that one failed call does not disable the backend.
#[derive(Debug, Clone)]
pub struct FlakyBackend {
    reply: String,
    failures: usize,
    kind: FailureKind,
    calls: Arc<AtomicUsize>,
}

impl FlakyBackend {
    pub fn new(failures: usize, kind: FailureKind, reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            failures,
            kind,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of calls attempted so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for FlakyBackend {
    async fn complete(&self, _request: ChatRequest) -> Result<String, BackendError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            Err(self.kind.to_error())
        } else {
            Ok(self.reply.clone())
        }
    }

    fn name(&self) -> &str {
        "FlakyBackend"
    }
}
