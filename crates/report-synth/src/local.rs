//! Deterministic local report renderer.
//!
//! Always available and never fails. Output depends only on the inputs.

use report_core::{NewsArticle, OutageData};

/// Maximum characters of outage data printed before truncation.
pub const OUTAGE_DATA_LIMIT: usize = 800;

/// Appended to truncated outage data.
pub const TRUNCATION_MARKER: &str = "...";

/// Maximum number of articles listed.
pub const MAX_RENDERED_ARTICLES: usize = 5;

pub const NO_OUTAGE_DATA: &str = "No outage data available (offline or API error).";

pub const NO_ARTICLES: &str = "No related articles found (offline or API error).";

const IMAGE_NOTE: &str = "Image: An outage map/image was provided by the user.";

/// Fixed guidance paragraph closing every local report.
pub const ANALYSIS_TEXT: &str = "Based on available signals and reports, an outage likely \
occurred in the target region. Possible causes include localized infrastructure failure, \
upstream transit disruptions, or intentional network restrictions. Cross-reference traffic \
anomalies with provider maintenance notices and incident trackers to confirm root cause.";

/// Compact string form of the outage data, cut at [`OUTAGE_DATA_LIMIT`]
/// characters.
pub fn summarize_outage(data: &OutageData) -> String {
    let full = data.to_string();
    if full.chars().count() <= OUTAGE_DATA_LIMIT {
        return full;
    }
    let mut cut: String = full.chars().take(OUTAGE_DATA_LIMIT).collect();
    cut.push_str(TRUNCATION_MARKER);
    cut
}

fn article_line(index: usize, article: &NewsArticle) -> String {
    format!(
        "{}. {} — {} {}",
        index,
        article.display_title().unwrap_or("Untitled"),
        article.display_source().unwrap_or("Unknown"),
        article.url.as_deref().unwrap_or_default()
    )
}

/// Render the plain-text report without an LLM.
///
/// Empty strings for `visualization_url` count as absent.
pub fn render_local(
    outage_data: Option<&OutageData>,
    news_articles: &[NewsArticle],
    visualization_url: Option<&str>,
    has_image: bool,
) -> String {
    let mut lines: Vec<String> = vec![
        "Network Outage Report".to_string(),
        "======================".to_string(),
    ];

    if let Some(url) = visualization_url.filter(|u| !u.is_empty()) {
        lines.push(format!("Visualization: {}", url));
    }
    lines.push(String::new());

    if has_image {
        lines.push(IMAGE_NOTE.to_string());
        lines.push(String::new());
    }

    lines.push("Outage Data:".to_string());
    match outage_data {
        Some(data) => lines.push(summarize_outage(data)),
        None => lines.push(NO_OUTAGE_DATA.to_string()),
    }
    lines.push(String::new());

    lines.push("Relevant News:".to_string());
    if news_articles.is_empty() {
        lines.push(NO_ARTICLES.to_string());
    } else {
        lines.extend(
            news_articles
                .iter()
                .take(MAX_RENDERED_ARTICLES)
                .enumerate()
                .map(|(i, article)| article_line(i + 1, article)),
        );
    }
    lines.push(String::new());

    lines.push("Analysis:".to_string());
    lines.push(ANALYSIS_TEXT.to_string());

    lines.join("\n")
}
