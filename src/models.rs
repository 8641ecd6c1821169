//! Data models for contribution calendars and GitHub API responses.
//!
//! # CHANGELOG (recent first, max 5 entries)
//! 10/16/2026 - Contribution calendar, stats and report models

use std::collections::btree_map::Values;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::CalendarLayout;

/// Per-day contribution counts before the calendar window is applied.
pub type DailyCounts = BTreeMap<NaiveDate, u32>;

/// One day of a contribution calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionDay {
    pub date: NaiveDate,
    pub count: u32,
    /// Intensity bucket 0-4, zero exactly when `count` is zero.
    pub level: u8,
}

/// Gap-free window of days ending today, ordered oldest first.
///
/// Only the calendar builder creates these, so every calendar covers the
/// full window with one entry per date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContributionCalendar {
    pub(crate) days: BTreeMap<NaiveDate, ContributionDay>,
}

impl ContributionCalendar {
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&ContributionDay> {
        self.days.get(&date)
    }

    /// Days in chronological order. Reverse it for newest first.
    pub fn days(&self) -> Values<'_, NaiveDate, ContributionDay> {
        self.days.values()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.days.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.keys().next_back().copied()
    }

    /// Sum of all daily counts.
    pub fn total(&self) -> u64 {
        self.days.values().map(|d| u64::from(d.count)).sum()
    }
}

/// Aggregate statistics over a calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionStats {
    pub total: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Calendar plus stats. Live and synthetic data share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionSummary {
    pub contributions: ContributionCalendar,
    pub stats: ContributionStats,
}

/// Per-day counts produced by a fetch strategy or the synthetic generator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawContributions {
    pub counts: DailyCounts,
    /// Total reported by the API, when it reports one.
    pub reported_total: Option<u64>,
}

/// Where the data in a report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    CalendarQuery,
    EventLogScan,
    Synthetic,
}

/// Contribution data as handed to callers of the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub source: DataSource,
    pub simulated: bool,
    /// Why simulated data is shown in place of a live fetch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(flatten)]
    pub summary: ContributionSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<CalendarLayout>,
}

impl ContributionReport {
    pub fn live(username: &str, source: DataSource, summary: ContributionSummary) -> Self {
        Self {
            username: Some(username.to_string()),
            source,
            simulated: false,
            notice: None,
            summary,
            layout: None,
        }
    }

    /// Synthetic report. `reason` is the failure that forced the fallback, if any.
    pub fn simulated(
        username: Option<&str>,
        summary: ContributionSummary,
        reason: Option<String>,
    ) -> Self {
        Self {
            username: username.map(str::to_string),
            source: DataSource::Synthetic,
            simulated: true,
            notice: reason.map(|r| format!("Showing simulated contribution data: {}", r)),
            summary,
            layout: None,
        }
    }

    pub fn with_layout(mut self) -> Self {
        self.layout = Some(CalendarLayout::from_calendar(&self.summary.contributions));
        self
    }
}

/// Public event from `GET /users/{username}/events/public`.
#[derive(Debug, Clone, Deserialize)]
pub struct PublicEvent {
    pub created_at: DateTime<Utc>,
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQLError>>,
}

/// GraphQL error.
#[derive(Debug, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default)]
    pub path: Option<Vec<serde_json::Value>>,
}
