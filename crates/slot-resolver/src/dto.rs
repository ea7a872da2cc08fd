//! Wire types for the resolution entry point and boundary normalization.
//!
//! The engine only ever sees whole minutes and UTC instants. Everything a
//! client might send instead (duration strings, naive local timestamps) is
//! normalized here.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use slot_engine::dst::{parse_timezone, resolve_wall_clock};
use slot_engine::{
    Participant, ResolutionRequest, ResolutionResult, SearchWindow, Tier, TieredIntervals,
    TimeInterval, WorkingHoursPolicy,
};

use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};

/// Naive layouts accepted after RFC 3339, interpreted in the request timezone.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// A meeting length as sent by a client: minutes, or a duration string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Minutes(i64),
    Text(String),
}

impl DurationValue {
    pub fn minutes(&self) -> Result<i64> {
        match self {
            DurationValue::Minutes(minutes) => Ok(*minutes),
            DurationValue::Text(text) => parse_duration(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub participants: Vec<Participant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<DurationValue>,
    pub window_start: String,
    pub window_end: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_attendee_percentage: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_suggestions: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<WorkingHoursPolicy>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl ResolveRequest {
    /// Normalize into an engine request, filling omitted fields from `config`.
    ///
    /// Does not run [`ResolutionRequest::validate`]; the orchestrator does.
    pub fn into_request(self, config: &ResolverConfig) -> Result<ResolutionRequest> {
        let tz = parse_timezone(&self.timezone)?;
        let start = parse_timestamp(&self.window_start, &tz)?;
        let end = parse_timestamp(&self.window_end, &tz)?;

        let duration_minutes = match &self.duration_minutes {
            Some(value) => value.minutes()?,
            None => config.default_duration_minutes,
        };

        let minimum_attendee_percentage = match self.minimum_attendee_percentage {
            Some(pct) => u8::try_from(pct).ok().filter(|pct| *pct <= 100).ok_or_else(|| {
                ResolveError::InvalidRequest(format!(
                    "minimumAttendeePercentage must be within 0-100, got {pct}"
                ))
            })?,
            None => config.default_minimum_attendee_percentage,
        };

        Ok(ResolutionRequest {
            participants: self.participants,
            duration_minutes,
            window: SearchWindow {
                start,
                end,
                timezone: tz,
                working_hours: self.working_hours,
            },
            max_suggestions: self.max_suggestions.unwrap_or(config.default_max_suggestions),
            minimum_attendee_percentage,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    NoSlots,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub tier: Tier,
    pub score: f64,
    pub confidence: f64,
    pub attendees: Vec<String>,
    pub missing_attendees: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub status: ResponseStatus,
    pub suggestions: Vec<Suggestion>,
    /// Machine-readable no-slot reason, e.g. `"no_common_free_time"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl From<&ResolutionResult> for ResolveResponse {
    fn from(result: &ResolutionResult) -> Self {
        let ids = |participants: &[Participant]| -> Vec<String> {
            participants.iter().map(|p| p.id.clone()).collect()
        };

        ResolveResponse {
            status: if result.is_success() {
                ResponseStatus::Success
            } else {
                ResponseStatus::NoSlots
            },
            suggestions: result
                .suggestions
                .iter()
                .map(|slot| Suggestion {
                    start: slot.interval.start(),
                    end: slot.interval.end(),
                    tier: slot.tier,
                    score: slot.score,
                    confidence: slot.confidence,
                    attendees: ids(&slot.attendees_satisfied),
                    missing_attendees: ids(&slot.attendees_missing),
                })
                .collect(),
            reason: result.reason.map(|r| r.code().to_string()),
            detail: result.reason.map(|r| r.describe().to_string()),
            warnings: result.warnings.clone(),
        }
    }
}

/// One participant's tiered free time, as printed by `meetslot free`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeView {
    pub participant: String,
    pub timezone: String,
    pub standard: Vec<TimeInterval>,
    pub extended: Vec<TimeInterval>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl FreeView {
    pub fn new(participant: &str, tz: &Tz, tiers: TieredIntervals, warnings: Vec<String>) -> Self {
        Self {
            participant: participant.to_string(),
            timezone: tz.name().to_string(),
            standard: tiers.standard,
            extended: tiers.extended,
            warnings,
        }
    }
}

/// Parse a meeting length into whole minutes.
///
/// Accepts `"45"`, `"30m"`, `"1.5h"`, `"1h30m"`, `"90 min"`, `"PT30M"`, `"PT1H30M"`.
pub fn parse_duration(text: &str) -> Result<i64> {
    let invalid = || ResolveError::InvalidRequest(format!("unrecognized duration '{text}'"));

    let lower = text.trim().to_ascii_lowercase();
    let minutes = if let Ok(minutes) = lower.parse::<i64>() {
        minutes
    } else {
        let mut rest = lower.strip_prefix("pt").unwrap_or(&lower).trim_start();
        if rest.is_empty() {
            return Err(invalid());
        }

        let mut total = 0.0_f64;
        while !rest.is_empty() {
            let number_len = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .unwrap_or(rest.len());
            let number: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
            rest = rest[number_len..].trim_start();

            let unit_len = rest
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(rest.len());
            let factor = match &rest[..unit_len] {
                "h" | "hr" | "hrs" | "hour" | "hours" => 60.0,
                "m" | "min" | "mins" | "minute" | "minutes" => 1.0,
                _ => return Err(invalid()),
            };
            total += number * factor;
            rest = rest[unit_len..].trim_start();
        }
        total.round() as i64
    };

    if minutes <= 0 {
        return Err(ResolveError::InvalidRequest(format!(
            "duration must be positive, got '{text}'"
        )));
    }
    Ok(minutes)
}

/// Parse an RFC 3339 timestamp, or a naive one interpreted in `tz`.
pub fn parse_timestamp(text: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Ok(instant.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|local| resolve_wall_clock(tz, local))
        .ok_or_else(|| ResolveError::InvalidRequest(format!("unrecognized timestamp '{text}'")))
}
