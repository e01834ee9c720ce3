//! Configuration for OpenAiBackend.

use std::time::Duration;

/// Default OpenAI API base URL.
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";

/// Default base URL of Ollama's OpenAI-compatible endpoint.
pub const OLLAMA_API_URL: &str = "http://localhost:11434/v1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for OpenAiBackend.
#[derive(Debug, Clone)]
pub struct OpenAiBackendConfig {
    /// API base URL; `/chat/completions` is appended.
    pub api_url: String,

    /// API key for authentication. Empty means no Authorization header.
    pub api_key: String,

    /// Timeout applied to each request.
    pub timeout: Duration,
}

impl Default for OpenAiBackendConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl OpenAiBackendConfig {
    /// Create a new config builder.
    pub fn builder() -> OpenAiBackendConfigBuilder {
        OpenAiBackendConfigBuilder::default()
    }

    /// Full URL of the chat completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_url.trim_end_matches('/'))
    }
}

/// Builder for OpenAiBackendConfig.
#[derive(Debug, Default)]
pub struct OpenAiBackendConfigBuilder {
    config: OpenAiBackendConfig,
}

impl OpenAiBackendConfigBuilder {
    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OpenAiBackendConfig {
        self.config
    }
}
