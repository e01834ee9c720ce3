//! News search client for a NewsAPI-compatible endpoint.

use std::time::Duration;

use report_core::{NewsArticle, TimeWindow};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::{build_http, FETCH_TIMEOUT};

/// Default news search endpoint.
pub const DEFAULT_NEWS_ENDPOINT: &str = "https://newsapi.org/v2/everything";

/// Articles requested per search.
pub const NEWS_PAGE_SIZE: u32 = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    articles: Vec<serde_json::Value>,
}

/// Client for news article search.
///
/// Without an API key the client never touches the network.
#[derive(Clone)]
pub struct NewsClient {
    api_key: String,
    endpoint: String,
    http: Option<Client>,
}

impl std::fmt::Debug for NewsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsClient")
            .field("endpoint", &self.endpoint)
            .field("has_api_key", &self.has_credential())
            .finish()
    }
}

impl NewsClient {
    /// Create a client; a missing or blank key disables fetching.
    pub fn new(api_key: Option<&str>) -> Self {
        Self {
            api_key: api_key.map(str::trim).unwrap_or_default().to_string(),
            endpoint: DEFAULT_NEWS_ENDPOINT.to_string(),
            http: build_http(FETCH_TIMEOUT),
        }
    }

    /// Use a different search endpoint (self-hosted mirror, test server).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Replace the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = build_http(timeout);
        self
    }

    pub fn has_credential(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Search for articles matching `query` published within `window`.
    ///
    /// Ordering is the provider's relevancy ranking. Returns an empty list
    /// when no key is configured or the search fails.
    pub async fn fetch_news(&self, query: &str, window: &TimeWindow) -> Vec<NewsArticle> {
        match self.try_fetch(query, window).await {
            Ok(articles) => {
                info!("Fetched {} news articles for '{}'", articles.len(), query);
                articles
            }
            Err(FetchError::MissingCredential) => {
                debug!("No news API key configured, skipping news search");
                Vec::new()
            }
            Err(e) => {
                warn!("News search failed for '{}': {}", query, e);
                Vec::new()
            }
        }
    }

    async fn try_fetch(
        &self,
        query: &str,
        window: &TimeWindow,
    ) -> Result<Vec<NewsArticle>, FetchError> {
        if !self.has_credential() {
            return Err(FetchError::MissingCredential);
        }
        let http = self.http.as_ref().ok_or(FetchError::Disabled)?;

        let page_size = NEWS_PAGE_SIZE.to_string();
        let params = [
            ("q", query.to_string()),
            ("from", window.start_iso()),
            ("to", window.end_iso()),
            ("sortBy", "relevancy".to_string()),
            ("language", "en".to_string()),
            ("pageSize", page_size),
            ("apiKey", self.api_key.clone()),
        ];

        debug!("Searching news at {} for '{}'", self.endpoint, query);

        let response = http.get(&self.endpoint).query(&params).send().await?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;

        // One odd article should not cost the whole result set
        let articles = parsed
            .articles
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<NewsArticle>(value) {
                Ok(article) => Some(article),
                Err(e) => {
                    debug!("Skipping unparsable article: {}", e);
                    None
                }
            })
            .collect();

        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::{Query, State};
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use tokio::sync::Mutex;

    fn window() -> TimeWindow {
        TimeWindow::ending_at(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(), 24).unwrap()
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v2/everything", addr)
    }

    #[tokio::test]
    async fn test_no_key_skips_request() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/v2/everything",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"articles": [{"title": "x"}]}))
                }),
            )
            .with_state(hits.clone());
        let endpoint = serve(router).await;

        let client = NewsClient::new(None).with_endpoint(endpoint.clone());
        assert!(client.fetch_news("Kyiv", &window()).await.is_empty());

        let blank = NewsClient::new(Some("   ")).with_endpoint(endpoint);
        assert!(blank.fetch_news("Kyiv", &window()).await.is_empty());

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_sends_params_and_parses() {
        let seen: Arc<Mutex<HashMap<String, String>>> = Arc::default();
        let router = Router::new()
            .route(
                "/v2/everything",
                get(
                    |State(seen): State<Arc<Mutex<HashMap<String, String>>>>,
                     Query(params): Query<HashMap<String, String>>| async move {
                        *seen.lock().await = params;
                        Json(json!({
                            "status": "ok",
                            "totalResults": 2,
                            "articles": [
                                {"title": "Fiber cut", "source": {"id": null, "name": "Reuters"}, "url": "u1"},
                                {"title": "Power grid", "source": "AP", "url": "u2", "description": "d"}
                            ]
                        }))
                    },
                ),
            )
            .with_state(seen.clone());
        let endpoint = serve(router).await;

        let client = NewsClient::new(Some("key-123")).with_endpoint(endpoint);
        let articles = client.fetch_news("Sanaa, Yemen", &window()).await;

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].display_title(), Some("Fiber cut"));
        assert_eq!(articles[0].display_source(), Some("Reuters"));
        assert_eq!(articles[1].display_source(), Some("AP"));

        let params = seen.lock().await.clone();
        assert_eq!(params["q"], "Sanaa, Yemen");
        assert_eq!(params["from"], "2024-02-29T12:00:00Z");
        assert_eq!(params["to"], "2024-03-01T12:00:00Z");
        assert_eq!(params["sortBy"], "relevancy");
        assert_eq!(params["language"], "en");
        assert_eq!(params["pageSize"], "10");
        assert_eq!(params["apiKey"], "key-123");
    }

    #[tokio::test]
    async fn test_bad_article_skipped() {
        let router = Router::new().route(
            "/v2/everything",
            get(|| async {
                Json(json!({"articles": [{"title": 42}, {"title": "ok", "url": "u"}]}))
            }),
        );
        let endpoint = serve(router).await;

        let articles = NewsClient::new(Some("k"))
            .with_endpoint(endpoint)
            .fetch_news("x", &window())
            .await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].display_title(), Some("ok"));
    }

    #[tokio::test]
    async fn test_non_200_is_empty() {
        let router = Router::new().route(
            "/v2/everything",
            get(|| async {
                (
                    AxumStatus::UNAUTHORIZED,
                    Json(json!({"status": "error", "code": "apiKeyInvalid"})),
                )
            }),
        );
        let endpoint = serve(router).await;

        let articles = NewsClient::new(Some("bad"))
            .with_endpoint(endpoint)
            .fetch_news("x", &window())
            .await;
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_or_missing_articles_is_empty() {
        let router = Router::new()
            .route("/v2/everything", get(|| async { "definitely not json" }))
            .route("/v2/other", get(|| async { Json(json!({"status": "ok"})) }));
        let endpoint = serve(router).await;

        let malformed = NewsClient::new(Some("k"))
            .with_endpoint(endpoint.clone())
            .fetch_news("x", &window())
            .await;
        assert!(malformed.is_empty());

        let missing = NewsClient::new(Some("k"))
            .with_endpoint(endpoint.replace("everything", "other"))
            .fetch_news("x", &window())
            .await;
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_is_empty() {
        let router = Router::new().route(
            "/v2/everything",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({"articles": []}))
            }),
        );
        let endpoint = serve(router).await;

        let articles = NewsClient::new(Some("k"))
            .with_endpoint(endpoint)
            .with_timeout(Duration::from_millis(200))
            .fetch_news("x", &window())
            .await;
        assert!(articles.is_empty());
    }
}
