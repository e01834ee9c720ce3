//! Report pipeline: outage data, news, synthesis.

use outage_sources::{IodaClient, NewsClient};
use report_core::{NewsArticle, PromptTemplate, TimeWindow};
use report_synth::ReportSynthesizer;
use tracing::{debug, info};

use crate::config::ReporterConfig;
use crate::error::OrchestratorError;

/// Runs the fetch-then-synthesize pipeline for a location.
///
/// Steps run strictly in sequence: outage signals, visualization link, news
/// search, report. Source failures degrade to absent data; the report is
/// always produced.
#[derive(Debug)]
pub struct Coordinator {
    ioda: IodaClient,
    news: NewsClient,
    synthesizer: ReportSynthesizer,
}

impl Coordinator {
    /// Create a coordinator from prebuilt components.
    pub fn new(ioda: IodaClient, news: NewsClient, synthesizer: ReportSynthesizer) -> Self {
        Self {
            ioda,
            news,
            synthesizer,
        }
    }

    /// Build all components from `config`.
    pub fn from_config(
        config: &ReporterConfig,
        template: PromptTemplate,
    ) -> Result<Self, OrchestratorError> {
        let (ioda, news) = source_clients(config);
        let synthesizer = ReportSynthesizer::new(config.renderer_config(), template)?;
        info!(
            "Coordinator ready (renderer: {:?}, news search: {})",
            synthesizer.mode(),
            if news.has_credential() { "on" } else { "off" }
        );

        Ok(Self::new(ioda, news, synthesizer))
    }

    pub fn synthesizer(&self) -> &ReportSynthesizer {
        &self.synthesizer
    }

    pub fn news(&self) -> &NewsClient {
        &self.news
    }

    /// Produce a report for `location` over `window`.
    pub async fn run(&self, location: &str, window: &TimeWindow) -> String {
        self.run_with_image(location, window, None).await
    }

    /// Produce a report, attaching a base64 PNG for the model if given.
    pub async fn run_with_image(
        &self,
        location: &str,
        window: &TimeWindow,
        image_base64: Option<&str>,
    ) -> String {
        info!(
            "Generating report for '{}' ({} to {})",
            location,
            window.start_iso(),
            window.end_iso()
        );

        let outage_data = self.ioda.fetch_outage_data(location, window).await;
        let visualization_url = self.ioda.visualization_url(location, window);
        let articles = self.news.fetch_news(location, window).await;

        debug!(
            "Inputs: outage data {}, {} articles, image {}",
            if outage_data.is_some() { "present" } else { "absent" },
            articles.len(),
            if image_base64.is_some() { "present" } else { "absent" }
        );

        self.synthesizer
            .generate_report(
                outage_data.as_ref(),
                &articles,
                Some(&visualization_url),
                image_base64,
            )
            .await
    }

    /// Produce a report from caller-supplied articles only.
    ///
    /// No sources are queried; the report carries no outage data and no
    /// visualization link.
    pub async fn report_from_articles(
        &self,
        articles: &[NewsArticle],
        image_base64: Option<&str>,
    ) -> String {
        info!("Generating report from {} supplied articles", articles.len());
        self.synthesizer
            .generate_report(None, articles, None, image_base64)
            .await
    }
}

/// Outage signal and news clients configured from `config`.
pub(crate) fn source_clients(config: &ReporterConfig) -> (IodaClient, NewsClient) {
    let ioda = IodaClient::new(config.ioda_base_url.as_deref());

    let mut news = NewsClient::new(config.news_api_key.as_deref());
    if let Some(endpoint) = config
        .news_endpoint
        .as_deref()
        .filter(|e| !e.trim().is_empty())
    {
        news = news.with_endpoint(endpoint.trim());
    }

    (ioda, news)
}
