//! IODA outage signal client.

use std::time::Duration;

use report_core::{OutageData, TimeWindow};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::{build_http, FETCH_TIMEOUT};

/// Default IODA API base URL.
pub const DEFAULT_IODA_BASE_URL: &str = "https://api.ioda.inetintel.cc.gatech.edu/v2";

/// Client for the IODA signals API.
#[derive(Debug, Clone)]
pub struct IodaClient {
    base_url: String,
    http: Option<Client>,
}

impl IodaClient {
    /// Create a client for `base_url`, or the public IODA API when `None`
    /// or blank.
    pub fn new(base_url: Option<&str>) -> Self {
        let base_url = base_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_IODA_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Self {
            base_url,
            http: build_http(FETCH_TIMEOUT),
        }
    }

    /// Replace the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = build_http(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch outage signals for `location` within `window`.
    ///
    /// Returns `None` when the data cannot be retrieved for any reason.
    pub async fn fetch_outage_data(
        &self,
        location: &str,
        window: &TimeWindow,
    ) -> Option<OutageData> {
        match self.try_fetch(location, window).await {
            Ok(data) => {
                info!(
                    "Outage data for '{}': {}",
                    location,
                    if data.is_some() { "received" } else { "empty" }
                );
                data
            }
            Err(e) => {
                warn!("Outage data unavailable for '{}': {}", location, e);
                None
            }
        }
    }

    async fn try_fetch(
        &self,
        location: &str,
        window: &TimeWindow,
    ) -> Result<Option<OutageData>, FetchError> {
        let http = self.http.as_ref().ok_or(FetchError::Disabled)?;
        let endpoint = format!("{}/signals", self.base_url);
        let params = [
            ("location", location.to_string()),
            ("start_time", window.start_iso()),
            ("end_time", window.end_iso()),
        ];

        debug!("Fetching outage signals from {} ({:?})", endpoint, params);

        let response = http.get(&endpoint).query(&params).send().await?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let value: serde_json::Value = serde_json::from_str(&body)?;
        Ok(OutageData::from_value(value))
    }

    /// Link to the IODA visualization for `location` within `window`.
    ///
    /// Pure string construction; performs no I/O.
    pub fn visualization_url(&self, location: &str, window: &TimeWindow) -> String {
        format!(
            "{}/visualization?location={}&start={}&end={}",
            self.base_url,
            urlencoding::encode(location),
            window.start_iso(),
            window.end_iso()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::extract::{Query, State};
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};
    use tokio::sync::Mutex;

    fn window() -> TimeWindow {
        TimeWindow::ending_at(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(), 4).unwrap()
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_default_base_url() {
        assert_eq!(IodaClient::new(None).base_url(), DEFAULT_IODA_BASE_URL);
        assert_eq!(IodaClient::new(Some("  ")).base_url(), DEFAULT_IODA_BASE_URL);
        assert_eq!(
            IodaClient::new(Some("http://ioda.local/v2/")).base_url(),
            "http://ioda.local/v2"
        );
    }

    #[test]
    fn test_visualization_url() {
        let client = IodaClient::new(Some("http://ioda.local/v2"));
        let url = client.visualization_url("Sanaa, Yemen", &window());
        assert_eq!(
            url,
            "http://ioda.local/v2/visualization?location=Sanaa%2C%20Yemen\
             &start=2024-03-01T08:00:00Z&end=2024-03-01T12:00:00Z"
        );
        // Deterministic
        assert_eq!(url, client.visualization_url("Sanaa, Yemen", &window()));
    }

    #[tokio::test]
    async fn test_fetch_success_sends_params() {
        let seen: Arc<Mutex<HashMap<String, String>>> = Arc::default();
        let router = Router::new()
            .route(
                "/signals",
                get(
                    |State(seen): State<Arc<Mutex<HashMap<String, String>>>>,
                     Query(params): Query<HashMap<String, String>>| async move {
                        *seen.lock().await = params;
                        Json(json!({"data": [{"datasource": "bgp", "values": [1, 0, 1]}]}))
                    },
                ),
            )
            .with_state(seen.clone());
        let base = serve(router).await;

        let client = IodaClient::new(Some(&base));
        let data = client.fetch_outage_data("Sanaa, Yemen", &window()).await.unwrap();
        assert_eq!(data.as_value()["data"][0]["datasource"], "bgp");

        let params = seen.lock().await.clone();
        assert_eq!(params["location"], "Sanaa, Yemen");
        assert_eq!(params["start_time"], "2024-03-01T08:00:00Z");
        assert_eq!(params["end_time"], "2024-03-01T12:00:00Z");
    }

    #[tokio::test]
    async fn test_non_200_is_absent() {
        let router = Router::new().route(
            "/signals",
            get(|| async { (AxumStatus::SERVICE_UNAVAILABLE, Json(json!({"error": "down"}))) }),
        );
        let base = serve(router).await;

        assert!(IodaClient::new(Some(&base))
            .fetch_outage_data("Kyiv", &window())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_malformed_json_is_absent() {
        let router = Router::new().route("/signals", get(|| async { "<html>oops</html>" }));
        let base = serve(router).await;

        assert!(IodaClient::new(Some(&base))
            .fetch_outage_data("Kyiv", &window())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_empty_payload_is_absent() {
        let router = Router::new().route("/signals", get(|| async { Json(Value::Null) }));
        let base = serve(router).await;

        assert!(IodaClient::new(Some(&base))
            .fetch_outage_data("Kyiv", &window())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_timeout_is_absent() {
        let router = Router::new().route(
            "/signals",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({"data": []}))
            }),
        );
        let base = serve(router).await;

        let client = IodaClient::new(Some(&base)).with_timeout(Duration::from_millis(200));
        assert!(client.fetch_outage_data("Kyiv", &window()).await.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_absent() {
        let client = IodaClient::new(Some("http://127.0.0.1:9"))
            .with_timeout(Duration::from_millis(500));
        assert!(client.fetch_outage_data("Kyiv", &window()).await.is_none());
    }
}
