//! Resolver configuration: JSON file, then environment overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use slot_engine::{ScoringPolicy, WorkingHoursPolicy};

use crate::error::{ResolveError, Result};

pub const ENV_PROVIDER_URL: &str = "MEETSLOT_PROVIDER_URL";
pub const ENV_GATHER_DEADLINE_MS: &str = "MEETSLOT_GATHER_DEADLINE_MS";
pub const ENV_MAX_CONCURRENT_FETCHES: &str = "MEETSLOT_MAX_CONCURRENT_FETCHES";

/// Backoff for transient calendar-source failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on each further attempt.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
        }
    }
}

impl RetryConfig {
    /// Delay before attempt `attempt + 1`, where `attempt` counts from zero.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverConfig {
    /// Overall deadline for gathering every participant's calendar.
    pub gather_deadline_ms: u64,
    /// Upper bound on in-flight calendar fetches.
    pub max_concurrent_fetches: usize,
    pub provider_timeout_ms: u64,
    /// External suggestion provider; `None` means local pipeline only.
    pub provider_url: Option<String>,
    pub working_hours: WorkingHoursPolicy,
    pub scoring: ScoringPolicy,
    pub default_max_suggestions: usize,
    pub default_minimum_attendee_percentage: u8,
    pub default_duration_minutes: i64,
    pub retry: RetryConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            gather_deadline_ms: 10_000,
            max_concurrent_fetches: 8,
            provider_timeout_ms: 15_000,
            provider_url: None,
            working_hours: WorkingHoursPolicy::default(),
            scoring: ScoringPolicy::default(),
            default_max_suggestions: 5,
            default_minimum_attendee_percentage: 100,
            default_duration_minutes: 30,
            retry: RetryConfig::default(),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ResolveError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string and validate it.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: ResolverConfig = serde_json::from_str(content)
            .map_err(|e| ResolveError::Config(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `MEETSLOT_*` environment variables on top of the current values.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_PROVIDER_URL) {
            let url = url.trim();
            self.provider_url = (!url.is_empty()).then(|| url.to_string());
        }
        if let Some(value) = lookup(ENV_GATHER_DEADLINE_MS) {
            self.gather_deadline_ms = parse_number(ENV_GATHER_DEADLINE_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_CONCURRENT_FETCHES) {
            self.max_concurrent_fetches = parse_number(ENV_MAX_CONCURRENT_FETCHES, &value)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_fetches == 0 {
            return Err(ResolveError::Config(
                "maxConcurrentFetches must be at least 1".to_string(),
            ));
        }
        if self.gather_deadline_ms == 0 {
            return Err(ResolveError::Config(
                "gatherDeadlineMs must be positive".to_string(),
            ));
        }
        if self.default_minimum_attendee_percentage > 100 {
            return Err(ResolveError::Config(
                "defaultMinimumAttendeePercentage must be within 0-100".to_string(),
            ));
        }
        self.working_hours
            .validate()
            .map_err(|e| ResolveError::Config(e.to_string()))
    }

    pub fn gather_deadline(&self) -> Duration {
        Duration::from_millis(self.gather_deadline_ms)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| {
            ResolveError::Config(format!("{key} must be a non-negative integer, got '{value}'"))
        })
}
