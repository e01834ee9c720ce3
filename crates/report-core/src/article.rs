//! Outage payloads and news articles.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque outage signal payload returned by the telemetry provider.
///
/// No schema is assumed; the payload is forwarded to the LLM as-is and
/// printed in compact JSON form by the local renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutageData(Value);

impl OutageData {
    /// Wrap a JSON value, treating null and empty containers as absent data.
    pub fn from_value(value: Value) -> Option<Self> {
        let empty = match &value {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::String(s) => s.is_empty(),
            _ => false,
        };
        if empty {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl fmt::Display for OutageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // serde_json's Display for Value is the compact serialization
        write!(f, "{}", self.0)
    }
}

/// Where an article came from.
///
/// NewsAPI returns `{"id": .., "name": ..}`; hand-built article lists often
/// carry a plain string instead. Both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArticleSource {
    Plain(String),
    Named {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl ArticleSource {
    /// The human-readable source name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            ArticleSource::Plain(name) => Some(name.as_str()),
            ArticleSource::Named { name, .. } => name.as_deref(),
        }
        .filter(|name| !name.is_empty())
    }
}

/// A news article from the news provider. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ArticleSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        rename = "publishedAt",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at: Option<String>,
}

impl NewsArticle {
    /// Title for display, `None` when missing or blank.
    pub fn display_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }

    /// Source name for display, `None` when missing or blank.
    pub fn display_source(&self) -> Option<&str> {
        self.source.as_ref().and_then(ArticleSource::name)
    }
}
