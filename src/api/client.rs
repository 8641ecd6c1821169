//! GitHub GraphQL and REST API client with connection pooling.
//!
//! # CHANGELOG (recent first, max 5 entries)
//! 10/16/2026 - Optional credential, contribution calendar and public events queries

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::error::FetchError;
use crate::models::{DailyCounts, GraphQLError, GraphQLResponse, PublicEvent, RawContributions};

const GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";
const REST_ENDPOINT: &str = "https://api.github.com";

/// Largest page the public events endpoint will return.
pub const EVENTS_PER_PAGE: u32 = 100;

/// Longest body excerpt kept in error messages.
const BODY_EXCERPT_CHARS: usize = 500;

/// GitHub API client with persistent connection pooling.
///
/// The credential is optional. Without one only the public REST endpoints
/// are usable.
pub struct GitHubClient {
    client: Client,
    token: Option<String>,
    graphql_endpoint: String,
    rest_endpoint: String,
}

impl GitHubClient {
    /// Create a new GitHub client against api.github.com.
    ///
    /// Token resolution order:
    /// 1. Explicit token parameter
    /// 2. GITHUB_TOKEN environment variable
    /// 3. GH_TOKEN environment variable
    /// 4. gh CLI config (~/.config/gh/hosts.yml)
    ///
    /// Finding no token is not an error.
    pub fn new(token: Option<String>) -> Result<Self> {
        let token = match token {
            token @ Some(_) => token,
            None => Self::resolve_token()?,
        };

        Self::with_endpoints(token, GRAPHQL_ENDPOINT, REST_ENDPOINT)
    }

    /// Create a client against explicit endpoints, skipping token discovery.
    pub fn with_endpoints(
        token: Option<String>,
        graphql_endpoint: &str,
        rest_endpoint: &str,
    ) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("fgp-contributions/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            token: token.filter(|t| !t.is_empty()),
            graphql_endpoint: graphql_endpoint.to_string(),
            rest_endpoint: rest_endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Resolve GitHub token from environment or gh CLI config.
    fn resolve_token() -> Result<Option<String>> {
        for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
            if let Ok(token) = std::env::var(var) {
                if !token.is_empty() {
                    tracing::debug!("Using GitHub token from {}", var);
                    return Ok(Some(token));
                }
            }
        }

        Self::read_gh_token()
    }

    /// Read token from gh CLI config file, if there is one.
    fn read_gh_token() -> Result<Option<String>> {
        let config_path = Self::gh_config_path()?;

        if !config_path.exists() {
            tracing::debug!(
                "No gh config at {}, continuing without a token",
                config_path.display()
            );
            return Ok(None);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read gh config file")?;

        Self::token_from_hosts(&content)
            .with_context(|| format!("Failed to parse gh config {}", config_path.display()))
    }

    /// Extract the github.com token from a gh `hosts.yml`.
    ///
    /// Handles both the flat layout and the multi-account layout where
    /// tokens live under `users.<login>`.
    fn token_from_hosts(content: &str) -> Result<Option<String>> {
        let config: Value = serde_yaml::from_str(content)?;

        let Some(host) = config.get("github.com") else {
            return Ok(None);
        };

        let flat = host.get("oauth_token").and_then(|t| t.as_str());
        let per_user = host.get("user").and_then(|u| u.as_str()).and_then(|user| {
            host.get("users")
                .and_then(|users| users.get(user))
                .and_then(|u| u.get("oauth_token"))
                .and_then(|t| t.as_str())
        });

        Ok(flat
            .or(per_user)
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string()))
    }

    /// Get gh CLI config path.
    fn gh_config_path() -> Result<PathBuf> {
        // Check XDG_CONFIG_HOME first
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg).join("gh").join("hosts.yml"));
        }

        // Fall back to ~/.config/gh/hosts.yml
        let home = dirs::home_dir().context("Could not determine home directory")?;

        Ok(home.join(".config").join("gh").join("hosts.yml"))
    }

    /// Execute a GraphQL query.
    async fn graphql<T: for<'de> Deserialize<'de>>(
        &self,
        query: &str,
        variables: Option<Value>,
    ) -> Result<T, FetchError> {
        let body = GraphQLRequest {
            query: query.to_string(),
            variables,
        };

        let mut request = self.client.post(&self.graphql_endpoint).json(&body);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        tracing::debug!("POST {}", self.graphql_endpoint);
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status,
                body: excerpt(&text),
            });
        }

        let text = response.text().await?;

        let result: GraphQLResponse<T> =
            serde_json::from_str(&text).map_err(|e| FetchError::Decode {
                message: format!("{} | Raw: {}", e, excerpt(&text)),
            })?;

        // Any reported error fails the query, even alongside partial data
        if let Some(errors) = result.errors.filter(|errors| !errors.is_empty()) {
            return Err(FetchError::GraphQL {
                messages: errors.iter().map(describe_graphql_error).collect(),
            });
        }

        result.data.ok_or_else(|| FetchError::Decode {
            message: "GraphQL response missing data field".to_string(),
        })
    }

    /// Execute a REST API request (GET).
    async fn rest_get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}{}", self.rest_endpoint, path);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        tracing::debug!("GET {}", url);
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status,
                body: excerpt(&text),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| FetchError::Decode {
            message: format!("{} | Raw: {}", e, excerpt(&text)),
        })
    }

    /// Check if the client can reach the GitHub API.
    ///
    /// With a token this resolves the viewer login. Without one it reads the
    /// anonymous rate limit and reports whether any requests remain.
    pub async fn ping(&self) -> Result<bool, FetchError> {
        if self.has_token() {
            let query = r#"
                query {
                    viewer {
                        login
                    }
                }
            "#;

            #[derive(Deserialize)]
            struct ViewerResponse {
                viewer: Viewer,
            }

            #[derive(Deserialize)]
            struct Viewer {
                login: String,
            }

            let result: ViewerResponse = self.graphql(query, None).await?;
            return Ok(!result.viewer.login.is_empty());
        }

        #[derive(Deserialize)]
        struct RateLimitResponse {
            rate: Rate,
        }

        #[derive(Deserialize)]
        struct Rate {
            limit: u32,
            remaining: u32,
        }

        let result: RateLimitResponse = self.rest_get("/rate_limit").await?;
        tracing::debug!(
            "Anonymous rate limit: {}/{} remaining",
            result.rate.remaining,
            result.rate.limit
        );
        Ok(result.rate.remaining > 0)
    }

    /// Daily contribution counts between `from` and `to` from the GraphQL calendar.
    pub async fn contribution_calendar(
        &self,
        username: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<RawContributions, FetchError> {
        let query = r#"
            query($username: String!, $from: DateTime!, $to: DateTime!) {
                user(login: $username) {
                    contributionsCollection(from: $from, to: $to) {
                        contributionCalendar {
                            totalContributions
                            weeks {
                                contributionDays {
                                    contributionCount
                                    date
                                    weekday
                                }
                            }
                        }
                    }
                }
            }
        "#;

        let variables = serde_json::json!({
            "username": username,
            "from": from.to_rfc3339_opts(SecondsFormat::Secs, true),
            "to": to.to_rfc3339_opts(SecondsFormat::Secs, true),
        });

        #[derive(Deserialize)]
        struct UserResponse {
            user: Option<UserData>,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct UserData {
            contributions_collection: CollectionData,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct CollectionData {
            contribution_calendar: CalendarData,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct CalendarData {
            total_contributions: u64,
            weeks: Vec<WeekData>,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct WeekData {
            contribution_days: Vec<DayData>,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct DayData {
            contribution_count: u32,
            date: NaiveDate,
        }

        let result: UserResponse = self.graphql(query, Some(variables)).await?;
        let calendar = result
            .user
            .ok_or_else(|| FetchError::UserNotFound {
                username: username.to_string(),
            })?
            .contributions_collection
            .contribution_calendar;

        let mut counts = DailyCounts::new();
        for day in calendar.weeks.into_iter().flat_map(|w| w.contribution_days) {
            *counts.entry(day.date).or_insert(0) += day.contribution_count;
        }

        Ok(RawContributions {
            counts,
            reported_total: Some(calendar.total_contributions),
        })
    }

    /// Most recent public events for `username`, newest first.
    pub async fn public_events(&self, username: &str) -> Result<Vec<PublicEvent>, FetchError> {
        self.rest_get(&format!(
            "/users/{}/events/public?per_page={}",
            username, EVENTS_PER_PAGE
        ))
        .await
    }
}

/// GraphQL request body.
#[derive(Serialize)]
struct GraphQLRequest {
    query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<Value>,
}

fn describe_graphql_error(error: &GraphQLError) -> String {
    match &error.path {
        Some(path) if !path.is_empty() => {
            let path: Vec<String> = path
                .iter()
                .map(|p| match p {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            format!("{} (at {})", error.message, path.join("."))
        }
        _ => error.message.clone(),
    }
}

/// First few hundred characters of a response body.
fn excerpt(text: &str) -> String {
    text.chars().take(BODY_EXCERPT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::FetchErrorKind;
    use chrono::TimeZone;
    use mockito::Matcher;

    fn client_for(server: &mockito::Server, token: Option<&str>) -> GitHubClient {
        GitHubClient::with_endpoints(
            token.map(str::to_string),
            &format!("{}/graphql", server.url()),
            &server.url(),
        )
        .unwrap()
    }

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        let to = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        (to - chrono::Duration::days(365), to)
    }

    #[test]
    fn test_gh_config_path() {
        let path = GitHubClient::gh_config_path().unwrap();
        assert!(path.to_string_lossy().contains("gh/hosts.yml"));
    }

    #[test]
    fn test_token_from_flat_hosts() {
        let yaml = "github.com:\n    oauth_token: gho_flat\n    user: octocat\n";
        let token = GitHubClient::token_from_hosts(yaml).unwrap();
        assert_eq!(token.as_deref(), Some("gho_flat"));
    }

    #[test]
    fn test_token_from_multi_account_hosts() {
        let yaml = "github.com:\n    user: octocat\n    users:\n        octocat:\n            oauth_token: gho_user\n        other:\n            oauth_token: gho_other\n";
        let token = GitHubClient::token_from_hosts(yaml).unwrap();
        assert_eq!(token.as_deref(), Some("gho_user"));
    }

    #[test]
    fn test_token_from_hosts_without_github() {
        let yaml = "ghe.example.com:\n    oauth_token: gho_enterprise\n";
        assert!(GitHubClient::token_from_hosts(yaml).unwrap().is_none());
    }

    #[test]
    fn test_empty_token_counts_as_none() {
        let client =
            GitHubClient::with_endpoints(Some(String::new()), GRAPHQL_ENDPOINT, REST_ENDPOINT)
                .unwrap();
        assert!(!client.has_token());
    }

    #[tokio::test]
    async fn test_contribution_calendar_flattens_weeks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_header("authorization", "Bearer test-token")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "variables": {
                    "username": "octocat",
                    "from": "2025-10-16T12:00:00Z",
                    "to": "2026-10-16T12:00:00Z",
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":{"user":{"contributionsCollection":{"contributionCalendar":{
                    "totalContributions": 9,
                    "weeks": [
                        {"contributionDays": [
                            {"contributionCount": 2, "date": "2026-10-10", "weekday": 6}
                        ]},
                        {"contributionDays": [
                            {"contributionCount": 0, "date": "2026-10-11", "weekday": 0},
                            {"contributionCount": 7, "date": "2026-10-16", "weekday": 5}
                        ]}
                    ]
                }}}}}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server, Some("test-token"));
        let (from, to) = window();
        let raw = client
            .contribution_calendar("octocat", from, to)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(raw.reported_total, Some(9));
        assert_eq!(raw.counts.len(), 3);
        assert_eq!(
            raw.counts.get(&NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()),
            Some(&7)
        );
    }

    #[tokio::test]
    async fn test_graphql_error_payload_is_protocol_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(
                r#"{"data":{"user":null},"errors":[{"message":"Could not resolve to a User with the login of 'ghost'.","path":["user"]}]}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server, Some("test-token"));
        let (from, to) = window();
        let err = client
            .contribution_calendar("ghost", from, to)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FetchErrorKind::Protocol);
        assert!(err.to_string().contains("Could not resolve"));
        assert!(err.to_string().contains("(at user)"));
    }

    #[tokio::test]
    async fn test_null_user_without_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(r#"{"data":{"user":null}}"#)
            .create_async()
            .await;

        let client = client_for(&server, Some("test-token"));
        let (from, to) = window();
        let err = client
            .contribution_calendar("ghost", from, to)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::UserNotFound { ref username } if username == "ghost"));
    }

    #[tokio::test]
    async fn test_graphql_unauthorized_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/graphql")
            .with_status(401)
            .with_body(r#"{"message":"Bad credentials"}"#)
            .create_async()
            .await;

        let client = client_for(&server, Some("expired"));
        let (from, to) = window();
        let err = client
            .contribution_calendar("octocat", from, to)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FetchErrorKind::Transport);
        assert_eq!(err.status().map(|s| s.as_u16()), Some(401));
        assert!(err.to_string().contains("Bad credentials"));
    }

    #[tokio::test]
    async fn test_public_events_request_shape() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/octocat/events/public")
            .match_query(Matcher::UrlEncoded("per_page".into(), "100".into()))
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(
                r#"[
                    {"id":"2","type":"PushEvent","created_at":"2026-10-16T09:00:00Z"},
                    {"id":"1","type":"IssuesEvent","created_at":"2026-10-15T23:59:59Z"}
                ]"#,
            )
            .create_async()
            .await;

        let client = client_for(&server, None);
        let events = client.public_events("octocat").await.unwrap();

        mock.assert_async().await;
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_public_events_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/octocat/events/public")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"not":"an array"}"#)
            .create_async()
            .await;

        let client = client_for(&server, None);
        let err = client.public_events("octocat").await.unwrap_err();

        assert!(matches!(err, FetchError::Decode { .. }));
        assert_eq!(err.kind(), FetchErrorKind::Protocol);
    }

    #[tokio::test]
    async fn test_ping_without_token_reads_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rate_limit")
            .with_status(200)
            .with_body(r#"{"resources":{},"rate":{"limit":60,"remaining":0,"reset":0,"used":60}}"#)
            .create_async()
            .await;

        let client = client_for(&server, None);
        assert!(!client.ping().await.unwrap());
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let text = "é".repeat(BODY_EXCERPT_CHARS + 10);
        assert_eq!(excerpt(&text).chars().count(), BODY_EXCERPT_CHARS);
    }
}
