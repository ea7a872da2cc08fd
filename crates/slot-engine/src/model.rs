//! Request-scoped data model: participants, search window, request, result.
//!
//! Everything here is built fresh for one resolution call and discarded after
//! the response is returned.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::parse_timezone;
use crate::error::{EngineError, Result};
use crate::interval::TimeInterval;
use crate::working_hours::{Tier, WorkingHoursPolicy};

/// How a participant's availability constrains a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Must be free for a slot to be feasible.
    #[default]
    Required,
    /// Counts toward the minimum attendee percentage.
    Optional,
    /// Like `Optional` for feasibility; their presence boosts a slot's score.
    Priority,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    /// Email address or opaque directory id.
    #[serde(alias = "email")]
    pub id: String,
    #[serde(default)]
    pub role: Role,
}

impl Participant {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    pub fn required(id: impl Into<String>) -> Self {
        Self::new(id, Role::Required)
    }

    pub fn optional(id: impl Into<String>) -> Self {
        Self::new(id, Role::Optional)
    }

    pub fn priority(id: impl Into<String>) -> Self {
        Self::new(id, Role::Priority)
    }

    pub fn is_required(&self) -> bool {
        self.role == Role::Required
    }
}

/// Outer bound of the search, plus the timezone used to interpret working hours.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timezone: Tz,
    /// Overrides the resolver's default policy for this request.
    pub working_hours: Option<WorkingHoursPolicy>,
}

impl SearchWindow {
    /// Build a window, parsing `timezone` as an IANA identifier.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, timezone: &str) -> Result<Self> {
        Ok(Self {
            start,
            end,
            timezone: parse_timezone(timezone)?,
            working_hours: None,
        })
    }

    pub fn with_working_hours(mut self, policy: WorkingHoursPolicy) -> Self {
        self.working_hours = Some(policy);
        self
    }

    /// The window as an interval, or `None` if it is empty or inverted.
    pub fn bounds(&self) -> Option<TimeInterval> {
        TimeInterval::non_empty(self.start, self.end)
    }

    /// The policy in force: the window's override, else `default`.
    pub fn policy<'a>(&'a self, default: &'a WorkingHoursPolicy) -> &'a WorkingHoursPolicy {
        self.working_hours.as_ref().unwrap_or(default)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionRequest {
    pub participants: Vec<Participant>,
    pub duration_minutes: i64,
    pub window: SearchWindow,
    pub max_suggestions: usize,
    /// Share of non-required participants (0–100) that must be free for a slot.
    pub minimum_attendee_percentage: u8,
}

impl ResolutionRequest {
    /// Reject requests that can never produce a meaningful answer.
    ///
    /// Checked before any calendar is fetched.
    pub fn validate(&self, default_policy: &WorkingHoursPolicy) -> Result<()> {
        let invalid = |msg: String| Err(EngineError::InvalidRequest(msg));

        if self.duration_minutes <= 0 {
            return invalid(format!(
                "duration must be positive, got {} minutes",
                self.duration_minutes
            ));
        }
        if self.window.end <= self.window.start {
            return invalid(format!(
                "window end {} is not after window start {}",
                self.window.end.to_rfc3339(),
                self.window.start.to_rfc3339()
            ));
        }
        if self.max_suggestions == 0 {
            return invalid("maxSuggestions must be positive".to_string());
        }
        if self.minimum_attendee_percentage > 100 {
            return invalid(format!(
                "minimumAttendeePercentage must be within 0-100, got {}",
                self.minimum_attendee_percentage
            ));
        }
        if !self.participants.iter().any(Participant::is_required) {
            return invalid("at least one required participant is needed".to_string());
        }
        for (i, participant) in self.participants.iter().enumerate() {
            if participant.id.trim().is_empty() {
                return invalid("participant identifier must not be empty".to_string());
            }
            let id = participant.id.trim();
            if self.participants[..i]
                .iter()
                .any(|p| p.id.trim().eq_ignore_ascii_case(id))
            {
                return invalid(format!("participant '{}' is listed twice", participant.id));
            }
        }

        let policy = self.window.policy(default_policy);
        policy.validate()?;
        if self.duration_minutes > policy.extended_span_minutes() {
            return invalid(format!(
                "duration of {} minutes exceeds the {}-minute extended working day",
                self.duration_minutes,
                policy.extended_span_minutes()
            ));
        }

        Ok(())
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(self.duration_minutes)
    }

    pub fn required(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.is_required())
    }

    pub fn priority(&self) -> Vec<Participant> {
        self.participants
            .iter()
            .filter(|p| p.role == Role::Priority)
            .cloned()
            .collect()
    }
}

/// A concrete proposed meeting time. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSlot {
    pub interval: TimeInterval,
    pub tier: Tier,
    pub attendees_satisfied: Vec<Participant>,
    pub attendees_missing: Vec<Participant>,
    /// Ranking score in `[0, 100]`.
    pub score: f64,
    /// Percentage of all participants free for the slot.
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    Success,
    NoSlotsFound,
}

/// Why an otherwise valid request produced no suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoSlotsReason {
    NoCommonFreeTime,
    DurationTooLongForWindow,
    AllParticipantsUnavailable,
}

impl NoSlotsReason {
    /// Wire code, e.g. `"no_common_free_time"`.
    pub fn code(&self) -> &'static str {
        match self {
            NoSlotsReason::NoCommonFreeTime => "no_common_free_time",
            NoSlotsReason::DurationTooLongForWindow => "duration_too_long_for_window",
            NoSlotsReason::AllParticipantsUnavailable => "all_participants_unavailable",
        }
    }

    /// Human-readable explanation for end users.
    pub fn describe(&self) -> &'static str {
        match self {
            NoSlotsReason::NoCommonFreeTime => {
                "the required participants share no free time in the search window"
            }
            NoSlotsReason::DurationTooLongForWindow => {
                "no shared free period is long enough for the requested duration"
            }
            NoSlotsReason::AllParticipantsUnavailable => {
                "a required participant has no free time in the search window"
            }
        }
    }
}

/// Terminal output of one resolution call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionResult {
    pub status: ResolutionStatus,
    pub suggestions: Vec<CandidateSlot>,
    pub reason: Option<NoSlotsReason>,
    /// Degraded-data disclosures, e.g. calendars that could not be fetched.
    pub warnings: Vec<String>,
}

impl ResolutionResult {
    pub fn success(suggestions: Vec<CandidateSlot>) -> Self {
        Self {
            status: ResolutionStatus::Success,
            suggestions,
            reason: None,
            warnings: Vec::new(),
        }
    }

    pub fn no_slots(reason: NoSlotsReason) -> Self {
        Self {
            status: ResolutionStatus::NoSlotsFound,
            suggestions: Vec::new(),
            reason: Some(reason),
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ResolutionStatus::Success
    }
}
