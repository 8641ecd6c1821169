//! Retrieval strategies for a year of daily contribution counts.
//!
//! With a credential the GraphQL contribution calendar gives exact daily
//! counts. Without one the public event log is tallied by day instead. The
//! event log only holds the most recent events, so activity older than it
//! retains is undercounted.

use chrono::{DateTime, Duration, Utc};

use crate::api::client::GitHubClient;
use crate::api::error::FetchError;
use crate::calendar::WINDOW_DAYS;
use crate::models::{DailyCounts, DataSource, PublicEvent, RawContributions};

/// How contribution counts are retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Authenticated GraphQL contribution calendar.
    CalendarQuery,
    /// Unauthenticated public event log, tallied per day.
    EventLogScan,
}

impl FetchStrategy {
    /// Pick the strategy once, based on credential presence.
    pub fn select(has_credential: bool) -> Self {
        if has_credential {
            FetchStrategy::CalendarQuery
        } else {
            FetchStrategy::EventLogScan
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FetchStrategy::CalendarQuery => "calendar_query",
            FetchStrategy::EventLogScan => "event_log_scan",
        }
    }

    /// Fetch raw daily counts for `username` covering the year up to `now`.
    pub async fn fetch(
        &self,
        client: &GitHubClient,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<RawContributions, FetchError> {
        tracing::info!("Fetching contributions for {} via {}", username, self.name());

        match self {
            FetchStrategy::CalendarQuery => {
                let from = now - Duration::days(i64::from(WINDOW_DAYS));
                client.contribution_calendar(username, from, now).await
            }
            FetchStrategy::EventLogScan => {
                let events = client.public_events(username).await?;
                tracing::debug!("Tallying {} public events for {}", events.len(), username);
                Ok(RawContributions {
                    counts: tally_events(&events),
                    reported_total: None,
                })
            }
        }
    }
}

impl From<FetchStrategy> for DataSource {
    fn from(strategy: FetchStrategy) -> Self {
        match strategy {
            FetchStrategy::CalendarQuery => DataSource::CalendarQuery,
            FetchStrategy::EventLogScan => DataSource::EventLogScan,
        }
    }
}

/// Count events per UTC date of their timestamp.
pub fn tally_events(events: &[PublicEvent]) -> DailyCounts {
    let mut counts = DailyCounts::new();
    for event in events {
        *counts.entry(event.created_at.date_naive()).or_insert(0) += 1;
    }
    counts
}

/// Reject identifiers that cannot be GitHub logins before any request is made.
pub fn validate_username(username: &str) -> Result<(), FetchError> {
    let valid = !username.is_empty()
        && username.len() <= 39
        && !username.starts_with('-')
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');

    if valid {
        Ok(())
    } else {
        Err(FetchError::InvalidUsername {
            username: username.to_string(),
        })
    }
}
