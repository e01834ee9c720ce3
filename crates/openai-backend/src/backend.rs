//! OpenAiBackend implementation.

use report_core::{async_trait, BackendError, ChatBackend, ChatRequest};
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse};
use crate::config::OpenAiBackendConfig;

/// A chat backend that talks to an OpenAI-compatible HTTP API.
///
/// The HTTP client is built once and reused for every request.
pub struct OpenAiBackend {
    client: Client,
    config: OpenAiBackendConfig,
    endpoint: Url,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("endpoint", &self.endpoint.as_str())
            .field("has_api_key", &!self.config.api_key.is_empty())
            .finish()
    }
}

impl OpenAiBackend {
    /// Create a new OpenAiBackend with the given configuration.
    ///
    /// Fails if the API URL is not an absolute http(s) URL or the HTTP
    /// client cannot be built.
    pub fn new(config: OpenAiBackendConfig) -> Result<Self, BackendError> {
        let endpoint = Url::parse(&config.completions_url()).map_err(|e| {
            BackendError::Configuration(format!("Invalid API URL '{}': {}", config.api_url, e))
        })?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(BackendError::Configuration(format!(
                "Unsupported URL scheme '{}' in '{}'",
                endpoint.scheme(),
                config.api_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "OpenAiBackend initialized for {} (timeout: {}s, credential: {})",
            endpoint,
            config.timeout.as_secs(),
            if config.api_key.is_empty() { "none" } else { "set" }
        );

        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    /// Make a chat completion request.
    async fn chat_completion(
        &self,
        request: &ChatRequest,
    ) -> Result<ChatCompletionResponse, BackendError> {
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        debug!(
            "Sending chat completion to {} (model: {}, messages: {})",
            self.endpoint,
            request.model,
            request.messages.len()
        );

        let mut builder = self.client.post(self.endpoint.clone()).json(&body);
        if !self.config.api_key.is_empty() {
            builder = builder.bearer_auth(&self.config.api_key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout
            } else {
                BackendError::Network(format!("Failed to send request: {}", e))
            }
        })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            // Try to parse as API error
            let message = serde_json::from_str::<ApiError>(&error_text)
                .map(|api_error| api_error.error.message)
                .unwrap_or(error_text);

            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout
            } else {
                BackendError::MalformedResponse(format!("Failed to parse response: {}", e))
            }
        })?;

        debug!(
            "Received completion id={:?} model={:?}",
            completion.id, completion.model
        );

        Ok(completion)
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(&self, request: ChatRequest) -> Result<String, BackendError> {
        let completion = self.chat_completion(&request).await?;

        if let Some(usage) = &completion.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        let choice = completion.choices.into_iter().next().ok_or_else(|| {
            BackendError::MalformedResponse("no choices in response".to_string())
        })?;

        if let Some(reason) = choice.finish_reason.as_deref() {
            if reason == "length" {
                warn!("Completion truncated at max_tokens");
            }
        }

        match choice.message.content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(BackendError::MalformedResponse(
                "first choice has no content".to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        "OpenAiBackend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use report_core::{ChatMessage, ContentPart};
    use serde_json::{json, Value};
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct Captured {
        body: Arc<Mutex<Option<Value>>>,
        auth: Arc<Mutex<Option<String>>>,
    }

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    async fn capture_and_reply(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        *captured.body.lock().await = Some(body);
        *captured.auth.lock().await = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Json(json!({
            "id": "cmpl-1",
            "model": "test-model",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "LLM report"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }))
    }

    fn request_with_image() -> ChatRequest {
        ChatRequest {
            model: "test-model".to_string(),
            messages: vec![
                ChatMessage::system("You are a network outage analysis assistant."),
                ChatMessage::user_parts(vec![
                    ContentPart::text("prompt"),
                    ContentPart::png_base64("iVBORw0KGgo="),
                ]),
            ],
            temperature: Some(0.2),
            max_tokens: Some(800),
        }
    }

    fn backend_for(url: &str, key: &str) -> OpenAiBackend {
        let config = OpenAiBackendConfig::builder()
            .api_url(url)
            .api_key(key)
            .timeout(Duration::from_millis(500))
            .build();
        OpenAiBackend::new(config).unwrap()
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = OpenAiBackendConfig::builder().api_url("not a url").build();
        assert!(matches!(
            OpenAiBackend::new(config),
            Err(BackendError::Configuration(_))
        ));
    }

    #[test]
    fn test_unsupported_scheme_rejected() {
        let config = OpenAiBackendConfig::builder()
            .api_url("ftp://example.com/v1")
            .build();
        assert!(matches!(
            OpenAiBackend::new(config),
            Err(BackendError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_completion_sends_multimodal_body() {
        let captured = Captured::default();
        let router = Router::new()
            .route("/v1/chat/completions", post(capture_and_reply))
            .with_state(captured.clone());
        let url = serve(router).await;

        let backend = backend_for(&url, "sk-test");
        let text = backend.complete(request_with_image()).await.unwrap();
        assert_eq!(text, "LLM report");

        let body = captured.body.lock().await.clone().unwrap();
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["max_tokens"], 800);
        assert_eq!(body["messages"][0]["role"], "system");
        let parts = body["messages"][1]["content"].as_array().unwrap();
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(
            parts[1]["image_url"]["url"],
            "data:image/png;base64,iVBORw0KGgo="
        );
        assert_eq!(
            captured.auth.lock().await.clone().as_deref(),
            Some("Bearer sk-test")
        );
    }

    #[tokio::test]
    async fn test_empty_credential_sends_no_auth_header() {
        let captured = Captured::default();
        let router = Router::new()
            .route("/v1/chat/completions", post(capture_and_reply))
            .with_state(captured.clone());
        let url = serve(router).await;

        let backend = backend_for(&url, "");
        backend.complete(request_with_image()).await.unwrap();
        assert!(captured.auth.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_server_error_maps_to_api_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": {"message": "bad key"}})),
                )
            }),
        );
        let url = serve(router).await;

        let err = backend_for(&url, "k")
            .complete(request_with_image())
            .await
            .unwrap_err();
        match err {
            BackendError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "bad key");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let router = Router::new().route("/v1/chat/completions", post(|| async { "not json" }));
        let url = serve(router).await;

        let err = backend_for(&url, "")
            .complete(request_with_image())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({"choices": []})) }),
        );
        let url = serve(router).await;

        let err = backend_for(&url, "")
            .complete(request_with_image())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({"choices": []}))
            }),
        );
        let url = serve(router).await;

        let err = backend_for(&url, "")
            .complete(request_with_image())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Timeout));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Port 9 (discard) is closed on test hosts
        let err = backend_for("http://127.0.0.1:9/v1", "")
            .complete(request_with_image())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BackendError::Network(_) | BackendError::Timeout
        ));
    }

    #[test]
    fn test_backend_name() {
        assert_eq!(backend_for("http://localhost:1/v1", "").name(), "OpenAiBackend");
    }
}
