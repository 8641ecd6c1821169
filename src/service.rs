//! FGP service implementation for GitHub contribution calendars.
//!
//! # CHANGELOG (recent first, max 5 entries)
//! 10/16/2026 - Contribution calendar, synthetic fallback and report cache

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use fgp_daemon::service::{HealthStatus, MethodInfo, ParamInfo};
use fgp_daemon::FgpService;
use serde_json::Value;
use tokio::runtime::Runtime;

use crate::api::{FetchErrorKind, FetchStrategy, GitHubClient};
use crate::cache::TtlCache;
use crate::calendar::{get_contributions, synthetic_contributions, SyntheticGenerator};
use crate::models::ContributionReport;

/// FGP service for GitHub contribution calendars.
pub struct ContributionsService {
    client: Arc<GitHubClient>,
    runtime: Runtime,
    cache: Mutex<TtlCache<ContributionReport>>,
}

impl ContributionsService {
    /// Create a new ContributionsService.
    ///
    /// Token is resolved from:
    /// 1. GITHUB_TOKEN / GH_TOKEN environment variables
    /// 2. gh CLI config (~/.config/gh/hosts.yml)
    ///
    /// Without a token the public event log is used.
    pub fn new(token: Option<String>, cache_ttl: Duration) -> Result<Self> {
        let client = GitHubClient::new(token)?;
        Self::with_client(client, cache_ttl)
    }

    pub fn with_client(client: GitHubClient, cache_ttl: Duration) -> Result<Self> {
        let runtime = Runtime::new()?;
        let cache = TtlCache::from_std(cache_ttl);
        tracing::debug!("Report cache TTL: {}s", cache.ttl().num_seconds());

        Ok(Self {
            client: Arc::new(client),
            runtime,
            cache: Mutex::new(cache),
        })
    }

    /// Helper to get a string parameter.
    fn get_str<'a>(params: &'a HashMap<String, Value>, key: &str) -> Option<&'a str> {
        params.get(key).and_then(|v| v.as_str())
    }

    /// Helper to get a bool parameter with default.
    fn get_bool(params: &HashMap<String, Value>, key: &str, default: bool) -> bool {
        params
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    /// Helper to get an optional u64 parameter.
    fn get_u64(params: &HashMap<String, Value>, key: &str) -> Option<u64> {
        params.get(key).and_then(|v| v.as_u64())
    }

    /// Contribution report for `username`.
    ///
    /// When the fetch fails and `fallback` is set, a synthetic report is
    /// returned instead, with a notice naming the failure.
    pub fn calendar_report(&self, username: &str, fallback: bool) -> Result<ContributionReport> {
        let now = Utc::now();
        let key = username.to_ascii_lowercase();

        if let Some(report) = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&key, now)
        {
            tracing::debug!("Cache hit for {}", key);
            return Ok(report);
        }

        let client = self.client.clone();
        let strategy = FetchStrategy::select(client.has_token());
        let user = username.to_string();

        let result = self
            .runtime
            .block_on(async move { get_contributions(&client, &user, now).await });

        match result {
            Ok(summary) => {
                let report = ContributionReport::live(username, strategy.into(), summary);
                let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                cache.insert(key, report.clone(), now);
                tracing::debug!("Report cache holds {} entries", cache.len());
                Ok(report)
            }
            Err(e) if fallback && e.kind() != FetchErrorKind::Input => {
                tracing::warn!(
                    status = ?e.status(),
                    "Falling back to synthetic contributions for {}: {}",
                    username,
                    e
                );
                let summary =
                    synthetic_contributions(now.date_naive(), &SyntheticGenerator::default());
                Ok(ContributionReport::simulated(
                    Some(username),
                    summary,
                    Some(e.to_string()),
                ))
            }
            Err(e) => {
                Err(e).with_context(|| format!("Failed to fetch contributions for {}", username))
            }
        }
    }

    /// Synthetic report, reproducible when `seed` is given.
    pub fn synthetic_report(seed: Option<u64>) -> ContributionReport {
        let generator = SyntheticGenerator {
            seed,
            ..SyntheticGenerator::default()
        };
        let summary = synthetic_contributions(Utc::now().date_naive(), &generator);
        ContributionReport::simulated(None, summary, None)
    }

    // ========================================================================
    // Method implementations
    // ========================================================================

    fn health(&self) -> Result<Value> {
        let client = self.client.clone();
        let ok = self.runtime.block_on(async move { client.ping().await })?;

        Ok(serde_json::json!({
            "status": if ok { "healthy" } else { "unhealthy" },
            "api_connected": ok,
            "authenticated": self.client.has_token(),
            "version": env!("CARGO_PKG_VERSION"),
        }))
    }

    fn calendar(&self, params: HashMap<String, Value>) -> Result<Value> {
        let username = Self::get_str(&params, "username")
            .ok_or_else(|| anyhow::anyhow!("Missing required parameter: username"))?;
        let fallback = Self::get_bool(&params, "fallback", true);
        let layout = Self::get_bool(&params, "layout", false);

        let mut report = self.calendar_report(username, fallback)?;
        if layout {
            report = report.with_layout();
        }

        Ok(serde_json::to_value(report)?)
    }

    fn synthetic(&self, params: HashMap<String, Value>) -> Result<Value> {
        let seed = Self::get_u64(&params, "seed");
        let layout = Self::get_bool(&params, "layout", false);

        let mut report = Self::synthetic_report(seed);
        if layout {
            report = report.with_layout();
        }

        Ok(serde_json::to_value(report)?)
    }
}

impl FgpService for ContributionsService {
    fn name(&self) -> &str {
        "contributions"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn dispatch(&self, method: &str, params: HashMap<String, Value>) -> Result<Value> {
        match method {
            "health" => self.health(),
            "calendar" | "contributions.calendar" => self.calendar(params),
            "synthetic" | "contributions.synthetic" => self.synthetic(params),
            _ => anyhow::bail!("Unknown method: {}", method),
        }
    }

    fn method_list(&self) -> Vec<MethodInfo> {
        vec![
            MethodInfo {
                name: "contributions.calendar".into(),
                description: "Contribution calendar and streaks for a GitHub user".into(),
                params: vec![
                    ParamInfo {
                        name: "username".into(),
                        param_type: "string".into(),
                        required: true,
                        default: None,
                    },
                    ParamInfo {
                        name: "fallback".into(),
                        param_type: "boolean".into(),
                        required: false,
                        default: Some(serde_json::json!(true)),
                    },
                    ParamInfo {
                        name: "layout".into(),
                        param_type: "boolean".into(),
                        required: false,
                        default: Some(serde_json::json!(false)),
                    },
                ],
            },
            MethodInfo {
                name: "contributions.synthetic".into(),
                description: "Simulated contribution calendar for demos".into(),
                params: vec![
                    ParamInfo {
                        name: "seed".into(),
                        param_type: "integer".into(),
                        required: false,
                        default: None,
                    },
                    ParamInfo {
                        name: "layout".into(),
                        param_type: "boolean".into(),
                        required: false,
                        default: Some(serde_json::json!(false)),
                    },
                ],
            },
        ]
    }

    fn on_start(&self) -> Result<()> {
        let mode = if self.client.has_token() {
            "authenticated calendar query"
        } else {
            "public event log"
        };
        tracing::info!(
            "ContributionsService starting ({}), verifying API connection...",
            mode
        );

        let client = self.client.clone();
        self.runtime.block_on(async move {
            match client.ping().await {
                Ok(true) => {
                    tracing::info!("GitHub API connection verified");
                    Ok(())
                }
                Ok(false) => {
                    tracing::warn!("GitHub API reachable but not usable (empty login or rate limited)");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("Failed to connect to GitHub API: {}", e);
                    Err(e.into())
                }
            }
        })
    }

    fn health_check(&self) -> HashMap<String, HealthStatus> {
        let mut checks = HashMap::new();

        let client = self.client.clone();
        let start = std::time::Instant::now();
        let result = self.runtime.block_on(async move { client.ping().await });

        let latency = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(true) => {
                checks.insert("github_api".into(), HealthStatus::healthy_with_latency(latency));
            }
            Ok(false) => {
                checks.insert(
                    "github_api".into(),
                    HealthStatus::unhealthy("Empty viewer login or rate limit exhausted"),
                );
            }
            Err(e) => {
                checks.insert("github_api".into(), HealthStatus::unhealthy(e.to_string()));
            }
        }

        checks
    }
}
