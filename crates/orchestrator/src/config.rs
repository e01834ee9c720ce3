//! Layered reporter configuration: defaults, YAML file, environment.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use report_synth::{ProviderSettings, RendererConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::OrchestratorError;

/// Config file read when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "configs/config.yaml";

/// Prompt template read when no path is given.
pub const DEFAULT_PROMPT_PATH: &str = "configs/prompts/report_prompt.txt";

/// All settings of the outage reporter.
///
/// Every key may be set in the YAML file and overridden by its environment
/// variable:
///
/// | key | env |
/// |-----|-----|
/// | `ioda_base_url` | `IODA_BASE_URL` |
/// | `news_api_key` | `NEWSAPI_KEY` |
/// | `news_endpoint` | `NEWS_ENDPOINT` |
/// | `openai_api_key` | `OPENAI_API_KEY` |
/// | `openai_model` | `OPENAI_MODEL` |
/// | `use_llm` | `USE_LLM` |
/// | `llm_provider` | `LLM_PROVIDER` |
/// | `llm_base_url` | `LLM_BASE_URL` |
/// | `local_model_path` | `LOCAL_MODEL_PATH` |
/// | `temperature` | `LLM_TEMPERATURE` |
/// | `max_tokens` | `LLM_MAX_TOKENS` |
/// | `llm_timeout_secs` | `LLM_TIMEOUT_SECS` |
/// | `default_location` | `DEFAULT_LOCATION` |
/// | `default_window_hours` | `DEFAULT_WINDOW_HOURS` |
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    pub ioda_base_url: Option<String>,
    pub news_api_key: Option<String>,
    pub news_endpoint: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub use_llm: bool,
    pub llm_provider: String,
    pub llm_base_url: Option<String>,
    pub local_model_path: Option<PathBuf>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub llm_timeout_secs: u64,
    pub default_location: String,
    pub default_window_hours: i64,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        let renderer = RendererConfig::default();
        Self {
            ioda_base_url: None,
            news_api_key: None,
            news_endpoint: None,
            openai_api_key: None,
            openai_model: renderer.model,
            use_llm: renderer.use_llm,
            llm_provider: "none".to_string(),
            llm_base_url: None,
            local_model_path: None,
            temperature: renderer.temperature,
            max_tokens: renderer.max_tokens,
            llm_timeout_secs: renderer.request_timeout.as_secs(),
            default_location: "Sanaa, Yemen".to_string(),
            default_window_hours: 4,
        }
    }
}

impl fmt::Debug for ReporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(key: &Option<String>) -> &'static str {
            match key {
                Some(k) if !k.is_empty() => "[REDACTED]",
                _ => "[unset]",
            }
        }

        f.debug_struct("ReporterConfig")
            .field("ioda_base_url", &self.ioda_base_url)
            .field("news_api_key", &redact(&self.news_api_key))
            .field("news_endpoint", &self.news_endpoint)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("openai_model", &self.openai_model)
            .field("use_llm", &self.use_llm)
            .field("llm_provider", &self.llm_provider)
            .field("llm_base_url", &self.llm_base_url)
            .field("local_model_path", &self.local_model_path)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("default_location", &self.default_location)
            .field("default_window_hours", &self.default_window_hours)
            .finish()
    }
}

impl ReporterConfig {
    /// Load configuration from the YAML file and the environment.
    ///
    /// An explicit `path` must be readable. Without one,
    /// [`DEFAULT_CONFIG_PATH`] is used if it exists and built-in defaults
    /// otherwise. Environment variables are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, OrchestratorError> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).is_file() => {
                Self::from_yaml_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a YAML config file. Missing keys take their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, OrchestratorError> {
        let content = fs::read_to_string(path).map_err(|source| OrchestratorError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content).map_err(|source| {
            OrchestratorError::ConfigParse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse YAML text. An empty document yields the defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    ///
    /// Blank values are ignored. Values that fail to parse are logged and
    /// ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("IODA_BASE_URL") {
            self.ioda_base_url = Some(v);
        }
        if let Some(v) = get("NEWSAPI_KEY") {
            self.news_api_key = Some(v);
        }
        if let Some(v) = get("NEWS_ENDPOINT") {
            self.news_endpoint = Some(v);
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.openai_api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.openai_model = v;
        }
        if let Some(v) = get("USE_LLM") {
            match parse_bool(&v) {
                Some(b) => self.use_llm = b,
                None => warn!("Ignoring USE_LLM={:?}: expected true or false", v),
            }
        }
        if let Some(v) = get("LLM_PROVIDER") {
            self.llm_provider = v;
        }
        if let Some(v) = get("LLM_BASE_URL") {
            self.llm_base_url = Some(v);
        }
        if let Some(v) = get("LOCAL_MODEL_PATH") {
            self.local_model_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("LLM_TEMPERATURE") {
            override_parsed("LLM_TEMPERATURE", &v, &mut self.temperature);
        }
        if let Some(v) = get("LLM_MAX_TOKENS") {
            override_parsed("LLM_MAX_TOKENS", &v, &mut self.max_tokens);
        }
        if let Some(v) = get("LLM_TIMEOUT_SECS") {
            override_parsed("LLM_TIMEOUT_SECS", &v, &mut self.llm_timeout_secs);
        }
        if let Some(v) = get("DEFAULT_LOCATION") {
            self.default_location = v;
        }
        if let Some(v) = get("DEFAULT_WINDOW_HOURS") {
            override_parsed("DEFAULT_WINDOW_HOURS", &v, &mut self.default_window_hours);
        }
    }

    /// Copy of this config with per-request LLM overrides applied.
    pub fn with_llm_overrides(&self, use_llm: Option<bool>, model: Option<&str>) -> Self {
        let mut config = self.clone();
        if let Some(use_llm) = use_llm {
            config.use_llm = use_llm;
        }
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            config.openai_model = model.to_string();
        }
        config
    }

    /// Synthesizer settings derived from this config.
    ///
    /// Provider settings are only read when `use_llm` is on; an unrecognized
    /// provider name then leaves the synthesizer on the local renderer.
    pub fn renderer_config(&self) -> RendererConfig {
        let provider = if self.use_llm {
            ProviderSettings::from_parts(
                &self.llm_provider,
                self.llm_base_url.clone(),
                self.openai_api_key.clone(),
                self.local_model_path.clone(),
            )
        } else {
            ProviderSettings::None
        };

        RendererConfig {
            use_llm: self.use_llm,
            provider,
            model: self.openai_model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            request_timeout: Duration::from_secs(self.llm_timeout_secs),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn override_parsed<T: std::str::FromStr>(key: &str, value: &str, target: &mut T) {
    match value.trim().parse() {
        Ok(parsed) => *target = parsed,
        Err(_) => warn!("Ignoring {}={:?}: not a valid value", key, value),
    }
}
