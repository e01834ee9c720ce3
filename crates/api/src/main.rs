use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use orchestrator::{
    Coordinator, NewsArticle, OrchestratorError, PromptTemplate, ReporterConfig, TimeWindow,
    DEFAULT_PROMPT_PATH,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Window used by `/news` when the request gives none.
const DEFAULT_NEWS_HOURS: i64 = 24;

#[derive(Clone)]
struct AppState {
    config: Arc<ReporterConfig>,
    template: PromptTemplate,
    coordinator: Arc<Coordinator>,
}

impl AppState {
    fn new(config: ReporterConfig, template: PromptTemplate) -> Result<Self, OrchestratorError> {
        let coordinator = Coordinator::from_config(&config, template.clone())?;
        Ok(Self {
            config: Arc::new(config),
            template,
            coordinator: Arc::new(coordinator),
        })
    }
}

#[derive(Debug, Serialize)]
struct Health {
    status: String,
}

#[derive(Debug, Serialize)]
struct ConfigSummary {
    default_location: String,
    default_window_hours: i64,
    llm_provider: String,
    use_llm: bool,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ReportRequest {
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    hours: Option<i64>,
    #[serde(default)]
    use_llm: Option<bool>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    image_base64: Option<String>,
    /// Raw article objects; entries that are not articles are skipped.
    #[serde(default)]
    articles: Option<Vec<serde_json::Value>>,
}

impl ReportRequest {
    fn supplied_articles(&mut self) -> Vec<NewsArticle> {
        self.articles
            .take()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<NewsArticle>(value) {
                Ok(article) => Some(article),
                Err(e) => {
                    debug!("Skipping unparsable supplied article: {}", e);
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct ReportResponse {
    location: String,
    hours: i64,
    generated_at: String,
    report: String,
}

#[derive(Debug, Deserialize)]
struct NewsRequest {
    query: String,
    #[serde(default)]
    hours: Option<i64>,
}

#[derive(Debug, Serialize)]
struct NewsResponse {
    articles: Vec<NewsArticle>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = env::var("OUTAGE_API_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());

    let config = ReporterConfig::load(None)?;
    let template = PromptTemplate::load_or_default(DEFAULT_PROMPT_PATH);
    let state = AppState::new(config, template)?;

    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("invalid OUTAGE_API_ADDR '{}'", addr))?;
    info!(%addr, "Outage reporter API listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/config", get(config_summary))
        .route("/report", post(create_report))
        .route("/news", post(fetch_news))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

async fn config_summary(State(state): State<AppState>) -> Json<ConfigSummary> {
    let config = &state.config;
    Json(ConfigSummary {
        default_location: config.default_location.clone(),
        default_window_hours: config.default_window_hours,
        llm_provider: config.llm_provider.clone(),
        use_llm: config.use_llm,
        model: config.openai_model.clone(),
    })
}

async fn create_report(
    State(state): State<AppState>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Json<ReportResponse>, ApiError> {
    let Json(mut payload) = payload?;
    let articles = payload.supplied_articles();
    let location = payload
        .location
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| state.config.default_location.clone());
    // Zero means "not given"
    let hours = payload
        .hours
        .filter(|h| *h != 0)
        .unwrap_or(state.config.default_window_hours);
    let window = TimeWindow::last_hours(hours)?;

    let model = payload.model.as_deref().filter(|m| !m.trim().is_empty());
    let coordinator = if payload.use_llm.is_some() || model.is_some() {
        let config = state.config.with_llm_overrides(payload.use_llm, model);
        info!(
            "Building request coordinator (use_llm: {}, model: {})",
            config.use_llm, config.openai_model
        );
        Arc::new(Coordinator::from_config(&config, state.template.clone())?)
    } else {
        state.coordinator.clone()
    };

    let image = payload.image_base64.as_deref();
    let report = if articles.is_empty() {
        coordinator.run_with_image(&location, &window, image).await
    } else {
        coordinator.report_from_articles(&articles, image).await
    };

    Ok(Json(ReportResponse {
        location,
        hours,
        generated_at: window.end_iso(),
        report,
    }))
}

async fn fetch_news(
    State(state): State<AppState>,
    payload: Result<Json<NewsRequest>, JsonRejection>,
) -> Result<Json<NewsResponse>, ApiError> {
    let Json(payload) = payload?;
    let hours = payload
        .hours
        .filter(|h| *h != 0)
        .unwrap_or(DEFAULT_NEWS_HOURS);
    let window = TimeWindow::last_hours(hours)?;

    let articles = state.coordinator.news().fetch_news(&payload.query, &window).await;
    Ok(Json(NewsResponse { articles }))
}

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    /// Request body rejected by the JSON extractor.
    Rejected(StatusCode, String),
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::Window(e) => ApiError::BadRequest(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<orchestrator::CoreError> for ApiError {
    fn from(err: orchestrator::CoreError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::Rejected(status, detail) => (status, detail),
            ApiError::Internal(detail) => {
                warn!("Request failed: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, detail)
            }
        };
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}
