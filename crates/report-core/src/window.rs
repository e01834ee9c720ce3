//! Time window for an outage query.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A closed UTC time range `[start, end]` with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window, rejecting ranges that end before they start.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidWindow {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// The window of `hours` hours ending at `end`.
    pub fn ending_at(end: DateTime<Utc>, hours: i64) -> Result<Self, CoreError> {
        if hours < 0 {
            return Err(CoreError::InvalidHours(hours));
        }
        let span = Duration::try_hours(hours).ok_or(CoreError::InvalidHours(hours))?;
        let start = end
            .checked_sub_signed(span)
            .ok_or(CoreError::InvalidHours(hours))?;
        Self::new(start, end)
    }

    /// The trailing window of `hours` hours ending now.
    pub fn last_hours(hours: i64) -> Result<Self, CoreError> {
        Self::ending_at(Utc::now(), hours)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// ISO-8601 form of the start timestamp.
    pub fn start_iso(&self) -> String {
        iso(self.start)
    }

    /// ISO-8601 form of the end timestamp.
    pub fn end_iso(&self) -> String {
        iso(self.end)
    }
}

fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
