//! Renderer configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use openai_backend::OLLAMA_API_URL;

use crate::error::SynthError;

/// Which backend family generates reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    None,
    OpenAiCompatible,
    InProcess,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::None => "none",
            ProviderKind::OpenAiCompatible => "openai_compatible",
            ProviderKind::InProcess => "in_process",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "" | "none" | "local" => Ok(ProviderKind::None),
            "openai" | "openai_compatible" | "ollama" => Ok(ProviderKind::OpenAiCompatible),
            "in_process" | "inprocess" | "local_model" => Ok(ProviderKind::InProcess),
            _ => Err(SynthError::UnknownProvider(s.to_string())),
        }
    }
}

/// Provider selection with the settings each variant needs.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ProviderSettings {
    #[default]
    None,
    OpenAiCompatible {
        /// API base URL; the backend default is used when unset.
        endpoint: Option<String>,
        /// Bearer credential; may be empty for self-hosted backends.
        credentials: Option<String>,
    },
    InProcess {
        /// Path of the model to load. Required.
        model_path: Option<PathBuf>,
    },
    /// A provider name nothing here recognizes.
    Unsupported { name: String },
}

impl ProviderSettings {
    /// Build settings from a provider name and the raw config values.
    ///
    /// The `ollama` alias selects the OpenAI-compatible provider with the
    /// local Ollama endpoint as its default. An unrecognized name yields
    /// [`ProviderSettings::Unsupported`].
    pub fn from_parts(
        provider: &str,
        endpoint: Option<String>,
        credentials: Option<String>,
        model_path: Option<PathBuf>,
    ) -> Self {
        let endpoint = endpoint.filter(|e| !e.trim().is_empty());

        let Ok(kind) = provider.parse::<ProviderKind>() else {
            return ProviderSettings::Unsupported {
                name: provider.trim().to_string(),
            };
        };

        match kind {
            ProviderKind::None => ProviderSettings::None,
            ProviderKind::OpenAiCompatible => {
                let endpoint = if provider.trim().eq_ignore_ascii_case("ollama") {
                    endpoint.or_else(|| Some(OLLAMA_API_URL.to_string()))
                } else {
                    endpoint
                };
                ProviderSettings::OpenAiCompatible {
                    endpoint,
                    credentials,
                }
            }
            ProviderKind::InProcess => ProviderSettings::InProcess { model_path },
        }
    }

    /// The provider family, or None for an unsupported name.
    pub fn kind(&self) -> Option<ProviderKind> {
        match self {
            ProviderSettings::None => Some(ProviderKind::None),
            ProviderSettings::OpenAiCompatible { .. } => Some(ProviderKind::OpenAiCompatible),
            ProviderSettings::InProcess { .. } => Some(ProviderKind::InProcess),
            ProviderSettings::Unsupported { .. } => None,
        }
    }
}

/// Configuration captured by the synthesizer at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Master switch for LLM rendering.
    pub use_llm: bool,
    /// Backend selection.
    pub provider: ProviderSettings,
    /// Model name sent with each request.
    pub model: String,
    /// Temperature for generation.
    pub temperature: f32,
    /// Maximum tokens for the report.
    pub max_tokens: u32,
    /// Upper bound on a single LLM call.
    pub request_timeout: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            use_llm: false,
            provider: ProviderSettings::None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 800,
            request_timeout: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RendererConfig::default();
        assert!(!config.use_llm);
        assert_eq!(config.provider, ProviderSettings::None);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_tokens, 800);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_parse_provider_names() {
        assert_eq!("none".parse::<ProviderKind>().unwrap(), ProviderKind::None);
        assert_eq!("".parse::<ProviderKind>().unwrap(), ProviderKind::None);
        assert_eq!(
            "OpenAI-Compatible".parse::<ProviderKind>().unwrap(),
            ProviderKind::OpenAiCompatible
        );
        assert_eq!("ollama".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAiCompatible);
        assert_eq!("in-process".parse::<ProviderKind>().unwrap(), ProviderKind::InProcess);
        assert!(matches!(
            "gemini".parse::<ProviderKind>(),
            Err(SynthError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_ollama_default_endpoint() {
        let settings = ProviderSettings::from_parts("ollama", None, None, None);
        assert_eq!(
            settings,
            ProviderSettings::OpenAiCompatible {
                endpoint: Some(OLLAMA_API_URL.to_string()),
                credentials: None,
            }
        );

        let custom =
            ProviderSettings::from_parts("ollama", Some("http://gpu:11434/v1".into()), None, None);
        assert_eq!(
            custom,
            ProviderSettings::OpenAiCompatible {
                endpoint: Some("http://gpu:11434/v1".to_string()),
                credentials: None,
            }
        );
    }

    #[test]
    fn test_blank_endpoint_ignored() {
        let settings =
            ProviderSettings::from_parts("openai", Some("  ".into()), Some("k".into()), None);
        assert_eq!(
            settings,
            ProviderSettings::OpenAiCompatible {
                endpoint: None,
                credentials: Some("k".to_string()),
            }
        );
    }

    #[test]
    fn test_in_process_settings() {
        let settings =
            ProviderSettings::from_parts("in_process", None, None, Some("models/m.gguf".into()));
        assert_eq!(settings.kind(), Some(ProviderKind::InProcess));
    }

    #[test]
    fn test_unrecognized_provider_is_unsupported() {
        let settings = ProviderSettings::from_parts(" gemini ", None, None, None);
        assert_eq!(
            settings,
            ProviderSettings::Unsupported {
                name: "gemini".to_string()
            }
        );
        assert_eq!(settings.kind(), None);
    }
}
