//! Slice the feasible timeline into candidate slots, score them, and order them.

use std::collections::HashSet;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::aggregate::{FeasibleInterval, FeasibleTimeline};
use crate::interval::TimeInterval;
use crate::model::{CandidateSlot, Participant};
use crate::working_hours::Tier;

/// When extended-hours candidates may be returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtendedHoursMode {
    /// Only when no standard-hours candidate exists.
    #[default]
    Fallback,
    /// Ranked alongside standard-hours candidates.
    Always,
    /// Never.
    Never,
}

/// Tunable scoring constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringPolicy {
    pub standard_base: f64,
    pub extended_base: f64,
    /// Subtracted once per missing optional or priority participant.
    pub missing_attendee_penalty: f64,
    /// Added when every priority participant can attend.
    pub priority_bonus: f64,
    pub extended_hours: ExtendedHoursMode,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            standard_base: 100.0,
            extended_base: 60.0,
            missing_attendee_penalty: 10.0,
            priority_bonus: 10.0,
            extended_hours: ExtendedHoursMode::Fallback,
        }
    }
}

impl ScoringPolicy {
    fn base(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Standard => self.standard_base,
            Tier::Extended => self.extended_base,
        }
    }

    /// Score of a candidate drawn from `feasible`, clamped to `[0, 100]`.
    pub fn score(&self, feasible: &FeasibleInterval, priority: &[Participant]) -> f64 {
        let mut score = self.base(feasible.tier)
            - self.missing_attendee_penalty * feasible.missing.len() as f64;

        let all_priority_present = !priority.is_empty()
            && priority
                .iter()
                .all(|p| feasible.satisfied.iter().any(|s| s.id == p.id));
        if all_priority_present {
            score += self.priority_bonus;
        }

        score.clamp(0.0, 100.0)
    }
}

/// Pick at most `max_suggestions` candidate slots from `timeline`.
///
/// Each feasible interval long enough for the meeting yields one candidate at
/// its earliest start. Candidates are ordered by score descending, then start
/// ascending, then tier.
pub fn select(
    timeline: &FeasibleTimeline,
    duration_minutes: i64,
    priority: &[Participant],
    max_suggestions: usize,
    policy: &ScoringPolicy,
) -> Vec<CandidateSlot> {
    let duration = Duration::minutes(duration_minutes);
    let mut standard = Vec::new();
    let mut extended = Vec::new();

    for feasible in &timeline.intervals {
        if feasible.interval.duration() < duration {
            continue;
        }
        let start = feasible.interval.start();
        let Some(interval) = TimeInterval::non_empty(start, start + duration) else {
            continue;
        };
        let total = feasible.satisfied.len() + feasible.missing.len();
        let confidence = if total == 0 {
            100.0
        } else {
            feasible.satisfied.len() as f64 * 100.0 / total as f64
        };
        let slot = CandidateSlot {
            interval,
            tier: feasible.tier,
            attendees_satisfied: feasible.satisfied.clone(),
            attendees_missing: feasible.missing.clone(),
            score: policy.score(feasible, priority),
            confidence,
        };
        match feasible.tier {
            Tier::Standard => standard.push(slot),
            Tier::Extended => extended.push(slot),
        }
    }

    let mut candidates = match policy.extended_hours {
        ExtendedHoursMode::Never => standard,
        ExtendedHoursMode::Fallback if !standard.is_empty() => standard,
        ExtendedHoursMode::Fallback | ExtendedHoursMode::Always => {
            standard.extend(extended);
            standard
        }
    };

    // The same slot can come out of both tiers; the standard copy was pushed first.
    let mut seen = HashSet::new();
    candidates.retain(|slot| seen.insert(slot.interval));

    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.interval.start().cmp(&b.interval.start()))
            .then_with(|| a.tier.cmp(&b.tier))
    });
    candidates.truncate(max_suggestions);
    candidates
}
