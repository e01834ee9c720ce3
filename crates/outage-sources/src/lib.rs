//! Data sources for outage reports.
//!
//! - [`IodaClient`] fetches connectivity signals from IODA (Internet Outage
//!   Detection and Analysis) and builds links to its visualization UI.
//! - [`NewsClient`] searches a NewsAPI-compatible endpoint for articles
//!   about a location.
//!
//! Both clients favour availability: every failure (unreachable host,
//! timeout, non-200 status, malformed JSON, missing credential) is logged
//! and turned into an absent or empty result. Callers never see an error.

mod error;
mod ioda;
mod news;

pub use error::FetchError;
pub use ioda::{IodaClient, DEFAULT_IODA_BASE_URL};
pub use news::{NewsClient, DEFAULT_NEWS_ENDPOINT, NEWS_PAGE_SIZE};

use std::time::Duration;

/// Timeout applied to every outage and news request.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the shared HTTP client, or `None` when the transport is unavailable.
fn build_http(timeout: Duration) -> Option<reqwest::Client> {
    match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!("HTTP transport disabled: {}", e);
            None
        }
    }
}
