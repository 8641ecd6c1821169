//! Contribution calendar pipeline.
//!
//! Raw daily counts (live or synthetic) go through the builder, then the
//! level classifier and the streak analyzer. Everything here is synchronous
//! except the single network call in [`get_contributions`].

pub mod builder;
pub mod layout;
pub mod levels;
pub mod streaks;
pub mod synthetic;

use chrono::{DateTime, NaiveDate, Utc};

pub use builder::{build_calendar, WINDOW_DAYS};
pub use layout::CalendarLayout;
pub use levels::classify_levels;
pub use streaks::analyze_streaks;
pub use synthetic::SyntheticGenerator;

use crate::api::strategy::validate_username;
use crate::api::{FetchError, FetchStrategy, GitHubClient};
use crate::models::{ContributionStats, ContributionSummary, RawContributions};

/// Turn raw counts into a classified calendar with stats.
///
/// An API-reported total takes precedence over the summed counts.
pub fn summarize(today: NaiveDate, raw: RawContributions) -> ContributionSummary {
    let calendar = classify_levels(build_calendar(today, &raw.counts));
    let streaks = analyze_streaks(&calendar);
    let total = raw.reported_total.unwrap_or_else(|| calendar.total());

    ContributionSummary {
        contributions: calendar,
        stats: ContributionStats {
            total,
            current_streak: streaks.current,
            longest_streak: streaks.longest,
        },
    }
}

/// Fetch a year of contributions for `username` from the best available source.
///
/// Failures are returned as-is. Falling back to synthetic data is up to the caller.
pub async fn get_contributions(
    client: &GitHubClient,
    username: &str,
    now: DateTime<Utc>,
) -> Result<ContributionSummary, FetchError> {
    validate_username(username)?;

    let strategy = FetchStrategy::select(client.has_token());
    let raw = strategy.fetch(client, username, now).await?;
    let summary = summarize(now.date_naive(), raw);

    if let (Some(first), Some(last)) = (
        summary.contributions.first_date(),
        summary.contributions.last_date(),
    ) {
        tracing::debug!(
            "{} days for {} via {} ({}..={})",
            summary.contributions.len(),
            username,
            strategy.name(),
            first,
            last
        );
    }

    Ok(summary)
}

/// Demo calendar in the same shape as [`get_contributions`].
pub fn synthetic_contributions(
    today: NaiveDate,
    generator: &SyntheticGenerator,
) -> ContributionSummary {
    summarize(
        today,
        RawContributions {
            counts: generator.generate(today),
            reported_total: None,
        },
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Days, NaiveDate};

    use crate::models::DailyCounts;

    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    /// Counts for the last `tail.len()` days, the final element landing on `today`.
    pub fn counts_ending_at(today: NaiveDate, tail: &[u32]) -> DailyCounts {
        tail.iter()
            .rev()
            .enumerate()
            .map(|(back, &count)| (today - Days::new(back as u64), count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{counts_ending_at, today};
    use super::*;
    use crate::api::FetchErrorKind;
    use chrono::TimeZone;

    #[test]
    fn test_summarize_sums_when_no_reported_total() {
        let raw = RawContributions {
            counts: counts_ending_at(today(), &[3, 0, 5, 2, 4]),
            reported_total: None,
        };

        let summary = summarize(today(), raw);

        assert_eq!(
            summary.stats,
            ContributionStats {
                total: 14,
                current_streak: 3,
                longest_streak: 3,
            }
        );
        assert_eq!(summary.contributions.len(), 365);
    }

    #[test]
    fn test_summarize_prefers_reported_total() {
        let raw = RawContributions {
            counts: counts_ending_at(today(), &[1, 1]),
            reported_total: Some(40),
        };

        assert_eq!(summarize(today(), raw).stats.total, 40);
    }

    #[test]
    fn test_all_zero_summary() {
        let summary = summarize(today(), RawContributions::default());
        assert_eq!(summary.stats, ContributionStats::default());
    }

    #[test]
    fn test_synthetic_summary_is_consistent() {
        let summary = synthetic_contributions(today(), &SyntheticGenerator::with_seed(3));

        assert_eq!(summary.contributions.len(), 365);
        assert_eq!(summary.stats.total, summary.contributions.total());
        assert!(summary.stats.longest_streak >= summary.stats.current_streak);
        assert!(summary
            .contributions
            .days()
            .all(|d| (d.count == 0) == (d.level == 0)));
    }

    #[tokio::test]
    async fn test_get_contributions_calendar_query() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(
                r#"{"data":{"user":{"contributionsCollection":{"contributionCalendar":{
                    "totalContributions": 12,
                    "weeks": [{"contributionDays": [
                        {"contributionCount": 5, "date": "2025-10-16", "weekday": 4},
                        {"contributionCount": 3, "date": "2026-10-15", "weekday": 4},
                        {"contributionCount": 4, "date": "2026-10-16", "weekday": 5}
                    ]}]
                }}}}}"#,
            )
            .create_async()
            .await;

        let client = GitHubClient::with_endpoints(
            Some("test-token".to_string()),
            &format!("{}/graphql", server.url()),
            &server.url(),
        )
        .unwrap();
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 18, 0, 0).unwrap();

        let summary = get_contributions(&client, "octocat", now).await.unwrap();

        // 2025-10-16 falls one day before the window
        assert!(summary
            .contributions
            .get(NaiveDate::from_ymd_opt(2025, 10, 16).unwrap())
            .is_none());
        assert_eq!(summary.contributions.total(), 7);
        assert_eq!(summary.stats.total, 12);
        assert_eq!(summary.stats.current_streak, 2);
    }

    #[tokio::test]
    async fn test_get_contributions_rejects_bad_username_without_io() {
        let client =
            GitHubClient::with_endpoints(None, "http://127.0.0.1:9/graphql", "http://127.0.0.1:9")
                .unwrap();

        let err = get_contributions(&client, "", Utc::now()).await.unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::Input);
    }
}
