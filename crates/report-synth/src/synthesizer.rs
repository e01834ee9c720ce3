//! ReportSynthesizer: provider selection and fallback policy.

use std::sync::Arc;

use openai_backend::{OpenAiBackend, OpenAiBackendConfig};
use report_core::{
    BackendError, ChatBackend, ChatMessage, ChatRequest, ContentPart, NewsArticle, OutageData,
    PromptContext, PromptTemplate,
};
use tracing::{debug, info, warn};

use crate::config::{ProviderSettings, RendererConfig};
use crate::error::SynthError;
use crate::local::render_local;
use crate::local_model::{GgufLoader, ModelLoader};

/// System instruction sent with every LLM request.
pub const SYSTEM_INSTRUCTION: &str = "You are a network outage analysis assistant.";

/// How reports are currently produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Local,
    OpenAiCompatible,
    InProcess,
}

/// Message shape expected by the active backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    /// System + multimodal user message.
    Remote,
    /// System + plain-text user message.
    InProcess,
}

enum Engine {
    Local,
    Llm {
        backend: Arc<dyn ChatBackend>,
        flavor: Flavor,
    },
}

/// Builds outage reports from fetched data.
///
/// The backend is chosen once at construction and never re-examined. A
/// backend that could not be constructed disables LLM rendering for the
/// lifetime of the synthesizer; a backend that fails on a single call only
/// costs that call, which is rendered locally instead.
pub struct ReportSynthesizer {
    config: RendererConfig,
    template: PromptTemplate,
    engine: Engine,
    /// Set only when backend construction failed.
    init_failure: Option<String>,
}

impl std::fmt::Debug for ReportSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportSynthesizer")
            .field("mode", &self.mode())
            .field("model", &self.config.model)
            .field("init_failure", &self.init_failure)
            .finish()
    }
}

impl ReportSynthesizer {
    /// Create a synthesizer, building the configured backend.
    ///
    /// In-process models are loaded as GGUF files with [`GgufLoader`].
    pub fn new(config: RendererConfig, template: PromptTemplate) -> Result<Self, SynthError> {
        Self::with_loader(config, template, &GgufLoader::default())
    }

    /// Create a synthesizer that loads in-process models through `loader`.
    ///
    /// Fails only when the in-process provider is selected without a model
    /// path. Every other construction problem is logged and leaves the
    /// synthesizer in local-render mode.
    pub fn with_loader(
        config: RendererConfig,
        template: PromptTemplate,
        loader: &dyn ModelLoader,
    ) -> Result<Self, SynthError> {
        let built = match &config.provider {
            _ if !config.use_llm => None,
            ProviderSettings::None => None,
            ProviderSettings::OpenAiCompatible {
                endpoint,
                credentials,
            } => Some(
                build_remote(&config, endpoint.as_deref(), credentials.as_deref())
                    .map(|backend| (backend, Flavor::Remote)),
            ),
            ProviderSettings::InProcess { model_path } => {
                let path = model_path
                    .as_ref()
                    .filter(|p| !p.as_os_str().is_empty())
                    .ok_or_else(|| {
                        SynthError::Configuration(
                            "in_process provider selected but no local model path configured"
                                .to_string(),
                        )
                    })?;
                info!("Loading in-process model from {}", path.display());
                Some(loader.load(path).map(|backend| (backend, Flavor::InProcess)))
            }
            ProviderSettings::Unsupported { name } => Some(Err(BackendError::Configuration(
                format!("unknown LLM provider '{}'", name),
            ))),
        };

        Ok(match built {
            None => {
                info!("Report synthesizer using local renderer");
                Self::assemble(config, template, Engine::Local, None)
            }
            Some(Ok((backend, flavor))) => {
                info!(
                    "Report synthesizer using {} (model: {})",
                    backend.name(),
                    config.model
                );
                Self::assemble(config, template, Engine::Llm { backend, flavor }, None)
            }
            Some(Err(e)) => {
                warn!(
                    "LLM backend construction failed, using local renderer for this process: {}",
                    e
                );
                Self::assemble(config, template, Engine::Local, Some(e.to_string()))
            }
        })
    }

    /// Create a synthesizer around an already-built backend.
    ///
    /// The message shape follows `config.provider`; when `use_llm` is off or
    /// the provider is `None` the backend is ignored.
    pub fn with_backend(
        config: RendererConfig,
        template: PromptTemplate,
        backend: Arc<dyn ChatBackend>,
    ) -> Self {
        let engine = match (&config.provider, config.use_llm) {
            (ProviderSettings::OpenAiCompatible { .. }, true) => Engine::Llm {
                backend,
                flavor: Flavor::Remote,
            },
            (ProviderSettings::InProcess { .. }, true) => Engine::Llm {
                backend,
                flavor: Flavor::InProcess,
            },
            _ => Engine::Local,
        };
        Self::assemble(config, template, engine, None)
    }

    fn assemble(
        config: RendererConfig,
        template: PromptTemplate,
        engine: Engine,
        init_failure: Option<String>,
    ) -> Self {
        info!("Report prompt fingerprint: {}", template.fingerprint());
        Self {
            config,
            template,
            engine,
            init_failure,
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn mode(&self) -> RenderMode {
        match &self.engine {
            Engine::Local => RenderMode::Local,
            Engine::Llm {
                flavor: Flavor::Remote,
                ..
            } => RenderMode::OpenAiCompatible,
            Engine::Llm {
                flavor: Flavor::InProcess,
                ..
            } => RenderMode::InProcess,
        }
    }

    /// True when LLM rendering was requested but its backend failed to build.
    pub fn is_llm_disabled(&self) -> bool {
        self.init_failure.is_some()
    }

    /// Why the backend failed to build, if it did.
    pub fn init_failure(&self) -> Option<&str> {
        self.init_failure.as_deref()
    }

    /// Fingerprint of the prompt template.
    pub fn prompt_fingerprint(&self) -> String {
        self.template.fingerprint()
    }

    /// Produce the report text. Never fails.
    pub async fn generate_report(
        &self,
        outage_data: Option<&OutageData>,
        news_articles: &[NewsArticle],
        visualization_url: Option<&str>,
        image_base64: Option<&str>,
    ) -> String {
        let visualization_url = visualization_url.filter(|u| !u.is_empty());
        let image_base64 = image_base64.filter(|i| !i.is_empty());

        let (backend, flavor) = match &self.engine {
            Engine::Local => {
                return render_local(
                    outage_data,
                    news_articles,
                    visualization_url,
                    image_base64.is_some(),
                )
            }
            Engine::Llm { backend, flavor } => (backend, *flavor),
        };

        let ctx = PromptContext::new(
            outage_data,
            news_articles,
            visualization_url,
            image_base64.is_some(),
        );
        let prompt = self.template.render(&ctx);
        let request = self.build_request(flavor, prompt, image_base64);

        match self.call_backend(backend.as_ref(), request).await {
            Ok(text) => {
                info!("Report generated by {} ({} chars)", backend.name(), text.len());
                text
            }
            Err(e) => {
                warn!(
                    "{} failed: {}. Falling back to local renderer.",
                    backend.name(),
                    e
                );
                render_local(
                    outage_data,
                    news_articles,
                    visualization_url,
                    image_base64.is_some(),
                )
            }
        }
    }

    async fn call_backend(
        &self,
        backend: &dyn ChatBackend,
        request: ChatRequest,
    ) -> Result<String, BackendError> {
        debug!(
            "Requesting report from {} (timeout: {}s)",
            backend.name(),
            self.config.request_timeout.as_secs()
        );
        match tokio::time::timeout(self.config.request_timeout, backend.complete(request)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => Ok(text),
            Ok(Ok(_)) => Err(BackendError::MalformedResponse(
                "empty completion".to_string(),
            )),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(BackendError::Timeout),
        }
    }

    fn build_request(&self, flavor: Flavor, prompt: String, image_base64: Option<&str>) -> ChatRequest {
        let user = match flavor {
            Flavor::InProcess => ChatMessage::user(prompt),
            Flavor::Remote => {
                let mut parts = vec![ContentPart::text(prompt)];
                if let Some(image) = image_base64 {
                    parts.push(ContentPart::png_base64(image));
                }
                ChatMessage::user_parts(parts)
            }
        };

        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_INSTRUCTION), user],
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
        }
    }
}

fn build_remote(
    config: &RendererConfig,
    endpoint: Option<&str>,
    credentials: Option<&str>,
) -> Result<Arc<dyn ChatBackend>, BackendError> {
    let mut builder = OpenAiBackendConfig::builder()
        .api_key(credentials.unwrap_or_default())
        .timeout(config.request_timeout);
    if let Some(endpoint) = endpoint {
        builder = builder.api_url(endpoint);
    }
    let backend = OpenAiBackend::new(builder.build())?;
    Ok(Arc::new(backend))
}
