use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slot_engine::recurrence::{expand_busy, RecurringCommitment};
use slot_engine::{SearchWindow, TimeInterval};
use tracing::warn;

use super::CalendarSource;
use crate::error::SourceError;

/// One entry in a participant's calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Commitment {
    /// A series described by an RRULE, anchored in local time.
    Recurring {
        rrule: String,
        /// Local start of the first occurrence, `YYYY-MM-DDTHH:MM:SS`.
        dtstart: String,
        #[serde(rename = "durationMinutes")]
        duration_minutes: u32,
        #[serde(default = "utc_zone")]
        timezone: String,
        #[serde(default)]
        exdates: Vec<String>,
        #[serde(default)]
        cancelled: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subject: Option<String>,
    },
    Fixed {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        #[serde(default)]
        cancelled: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subject: Option<String>,
    },
}

fn utc_zone() -> String {
    "UTC".to_string()
}

impl Commitment {
    pub fn is_cancelled(&self) -> bool {
        match self {
            Commitment::Recurring { cancelled, .. } | Commitment::Fixed { cancelled, .. } => {
                *cancelled
            }
        }
    }

    pub fn subject(&self) -> Option<&str> {
        match self {
            Commitment::Recurring { subject, .. } | Commitment::Fixed { subject, .. } => {
                subject.as_deref()
            }
        }
    }

    /// Busy intervals this commitment contributes inside `[start, end)`.
    pub fn busy_within(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeInterval>, SourceError> {
        match self {
            Commitment::Fixed {
                start: from,
                end: until,
                ..
            } => {
                let interval = TimeInterval::new(*from, *until)
                    .map_err(|e| SourceError::Store(e.to_string()))?;
                Ok(if interval.start() < end && interval.end() > start {
                    vec![interval]
                } else {
                    Vec::new()
                })
            }
            Commitment::Recurring {
                rrule,
                dtstart,
                duration_minutes,
                timezone,
                exdates,
                ..
            } => {
                let exdates: Vec<&str> = exdates.iter().map(String::as_str).collect();
                let commitment = RecurringCommitment {
                    rrule,
                    dtstart,
                    duration_minutes: *duration_minutes,
                    timezone,
                    exdates: &exdates,
                };
                expand_busy(&commitment, start, end)
                    .map_err(|e| SourceError::Store(e.to_string()))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct StoreDocument {
    calendars: BTreeMap<String, Vec<Commitment>>,
}

/// Calendar source backed by a local JSON document.
///
/// ```json
/// { "calendars": {
///     "alice@example.com": [
///       { "start": "2026-03-16T09:00:00Z", "end": "2026-03-16T10:00:00Z" },
///       { "rrule": "FREQ=WEEKLY;BYDAY=MO", "dtstart": "2026-03-02T14:00:00",
///         "durationMinutes": 30, "timezone": "Europe/Berlin" }
///     ]
/// } }
/// ```
///
/// Participant identifiers match case-insensitively. An entry that cannot be
/// turned into busy time (an inverted range, a bad RRULE) is skipped with a
/// warning; the rest of that participant's calendar still counts.
#[derive(Debug, Clone, Default)]
pub struct LocalStoreSource {
    calendars: BTreeMap<String, Vec<Commitment>>,
}

impl LocalStoreSource {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SourceError::Store(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, SourceError> {
        let document: StoreDocument = serde_json::from_str(content)
            .map_err(|e| SourceError::Store(format!("invalid calendar store: {e}")))?;

        let mut calendars: BTreeMap<String, Vec<Commitment>> = BTreeMap::new();
        for (participant, commitments) in document.calendars {
            calendars
                .entry(normalize(&participant))
                .or_default()
                .extend(commitments);
        }
        Ok(Self { calendars })
    }

    /// Known participant identifiers, normalized, in sorted order.
    pub fn participants(&self) -> impl Iterator<Item = &str> {
        self.calendars.keys().map(String::as_str)
    }

    pub fn commitments(&self, participant: &str) -> Option<&[Commitment]> {
        self.calendars.get(&normalize(participant)).map(Vec::as_slice)
    }
}

fn normalize(participant: &str) -> String {
    participant.trim().to_lowercase()
}

#[async_trait]
impl CalendarSource for LocalStoreSource {
    async fn fetch_busy(
        &self,
        participant: &str,
        window: &SearchWindow,
    ) -> Result<Vec<TimeInterval>, SourceError> {
        let commitments = self
            .commitments(participant)
            .ok_or_else(|| SourceError::NotFound(participant.to_string()))?;

        let mut busy = Vec::new();
        for commitment in commitments.iter().filter(|c| !c.is_cancelled()) {
            match commitment.busy_within(window.start, window.end) {
                Ok(intervals) => busy.extend(intervals),
                Err(err) => warn!(
                    participant,
                    subject = commitment.subject().unwrap_or_default(),
                    error = %err,
                    "Skipping unusable calendar entry"
                ),
            }
        }
        Ok(busy)
    }
}
