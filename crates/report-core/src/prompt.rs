//! Report prompt template and prompt fingerprinting.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::article::{NewsArticle, OutageData};

/// Built-in report prompt, used when no template file is configured.
pub const DEFAULT_REPORT_PROMPT: &str = "\
You are analyzing a possible internet outage.

Outage signal data (from IODA):
{outage_data}

Related news articles:
{news_articles}

Visualization: {visualization_url}

{image_context}

Write a concise report covering: what happened, when, the likely cause, \
the affected networks or regions, and how confident the evidence is. \
Cite article titles where they support a conclusion.";

const IMAGE_PROVIDED: &str = "User provided an outage image (PNG).";
const NO_IMAGE: &str = "No image provided.";

/// Compute a stable SHA-256 fingerprint for a prompt string.
pub fn hash_prompt(prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// Values substituted into the four named placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub outage_data: String,
    pub news_articles: String,
    pub visualization_url: String,
    pub image_context: String,
}

impl PromptContext {
    pub fn new(
        outage_data: Option<&OutageData>,
        news_articles: &[NewsArticle],
        visualization_url: Option<&str>,
        has_image: bool,
    ) -> Self {
        Self {
            outage_data: outage_data
                .map(|d| d.to_string())
                .unwrap_or_else(|| "null".to_string()),
            news_articles: serde_json::to_string(news_articles)
                .unwrap_or_else(|_| "[]".to_string()),
            visualization_url: visualization_url.unwrap_or_default().to_string(),
            image_context: if has_image { IMAGE_PROVIDED } else { NO_IMAGE }.to_string(),
        }
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "outage_data" => Some(&self.outage_data),
            "news_articles" => Some(&self.news_articles),
            "visualization_url" => Some(&self.visualization_url),
            "image_context" => Some(&self.image_context),
            _ => None,
        }
    }
}

/// A prompt template with `{name}` placeholders.
///
/// `{{` and `}}` produce literal braces. Unknown placeholders are kept
/// verbatim so templates containing JSON examples survive rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_PROMPT)
    }
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Load a template file, returning None if not found or empty.
    pub fn load(path: impl AsRef<Path>) -> Option<Self> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(content) if content.trim().is_empty() => None,
            Ok(content) => Some(Self::new(content)),
            Err(_) => None,
        }
    }

    /// Load a template file, falling back to the built-in prompt.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Fingerprint of the raw template text.
    pub fn fingerprint(&self) -> String {
        hash_prompt(&self.text)
    }

    /// Substitute placeholders from `ctx`.
    pub fn render(&self, ctx: &PromptContext) -> String {
        let mut out = String::with_capacity(self.text.len() + 256);
        let mut rest = self.text.as_str();

        while let Some(pos) = rest.find(['{', '}']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if tail.starts_with("{{") {
                out.push('{');
                rest = &tail[2..];
            } else if tail.starts_with("}}") {
                out.push('}');
                rest = &tail[2..];
            } else if tail.starts_with('}') {
                out.push('}');
                rest = &tail[1..];
            } else {
                match tail[1..].find('}') {
                    Some(close) => {
                        let name = &tail[1..1 + close];
                        match ctx.lookup(name) {
                            Some(value) => out.push_str(value),
                            None => out.push_str(&tail[..close + 2]),
                        }
                        rest = &tail[close + 2..];
                    }
                    None => {
                        out.push_str(tail);
                        rest = "";
                    }
                }
            }
        }

        out.push_str(rest);
        out
    }
}
