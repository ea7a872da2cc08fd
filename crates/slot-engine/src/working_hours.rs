//! Project free time onto a working-hours policy, split into availability tiers.
//!
//! Each input interval is walked day by day in the target timezone. On days that
//! are not excluded, the part of the interval inside standard hours goes to the
//! `standard` tier; the parts inside the extended window but before or after
//! standard hours go to the `extended` tier. Time outside the extended window,
//! and all time on excluded weekdays, is dropped.

use chrono::{Datelike, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::day_boundary;
use crate::error::{EngineError, Result};
use crate::interval::{self, TimeInterval};

/// Availability tier of a free interval or candidate slot.
///
/// Ordered so that `Standard < Extended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Inside core working hours.
    Standard,
    /// Early or late hours: technically free, lower confidence.
    Extended,
}

/// Working-hours policy, interpreted in the search window's timezone.
///
/// Hours are whole hours `0..=24`; `24` is the midnight that ends the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkingHoursPolicy {
    pub standard_start_hour: u32,
    pub standard_end_hour: u32,
    pub extended_start_hour: u32,
    pub extended_end_hour: u32,
    pub excluded_weekdays: Vec<Weekday>,
}

impl Default for WorkingHoursPolicy {
    fn default() -> Self {
        Self {
            standard_start_hour: 9,
            standard_end_hour: 18,
            extended_start_hour: 7,
            extended_end_hour: 23,
            excluded_weekdays: vec![Weekday::Sat, Weekday::Sun],
        }
    }
}

impl WorkingHoursPolicy {
    /// Reject policies whose windows are out of range or out of order.
    ///
    /// Valid iff `extended_start <= standard_start < standard_end <= extended_end <= 24`.
    pub fn validate(&self) -> Result<()> {
        let ordered = self.extended_start_hour <= self.standard_start_hour
            && self.standard_start_hour < self.standard_end_hour
            && self.standard_end_hour <= self.extended_end_hour
            && self.extended_end_hour <= 24;
        if ordered {
            Ok(())
        } else {
            Err(EngineError::InvalidRequest(format!(
                "working hours must satisfy extended start {} <= standard start {} \
                 < standard end {} <= extended end {} <= 24",
                self.extended_start_hour,
                self.standard_start_hour,
                self.standard_end_hour,
                self.extended_end_hour
            )))
        }
    }

    pub fn is_excluded(&self, day: Weekday) -> bool {
        self.excluded_weekdays.contains(&day)
    }

    pub fn standard_span_minutes(&self) -> i64 {
        i64::from(self.standard_end_hour.saturating_sub(self.standard_start_hour)) * 60
    }

    /// Length of one day's full extended window (standard hours included).
    pub fn extended_span_minutes(&self) -> i64 {
        i64::from(self.extended_end_hour.saturating_sub(self.extended_start_hour)) * 60
    }
}

/// Free time split by tier. Each tier is sorted and non-overlapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TieredIntervals {
    pub standard: Vec<TimeInterval>,
    pub extended: Vec<TimeInterval>,
}

impl TieredIntervals {
    /// Standard and extended time together: everything usable for a meeting.
    pub fn combined(&self) -> Vec<TimeInterval> {
        interval::union(&self.standard, &self.extended)
    }

    /// The free time that counts toward `tier`.
    ///
    /// Standard-hours time is also available for an extended-tier meeting, so
    /// the extended view is the union of both tiers.
    pub fn for_tier(&self, tier: Tier) -> Vec<TimeInterval> {
        match tier {
            Tier::Standard => self.standard.clone(),
            Tier::Extended => self.combined(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.standard.is_empty() && self.extended.is_empty()
    }
}

/// Project `intervals` onto `policy` in `tz`.
pub fn apply(intervals: &[TimeInterval], policy: &WorkingHoursPolicy, tz: &Tz) -> TieredIntervals {
    let mut standard = Vec::new();
    let mut extended = Vec::new();

    for interval in intervals {
        let first_day = interval.start().with_timezone(tz).date_naive();
        let last_day = interval.end().with_timezone(tz).date_naive();

        for day in first_day.iter_days().take_while(|day| *day <= last_day) {
            if policy.is_excluded(day.weekday()) {
                continue;
            }

            let extended_start = day_boundary(tz, day, policy.extended_start_hour);
            let standard_start = day_boundary(tz, day, policy.standard_start_hour);
            let standard_end = day_boundary(tz, day, policy.standard_end_hour);
            let extended_end = day_boundary(tz, day, policy.extended_end_hour);

            push_overlap(&mut standard, interval, standard_start, standard_end);
            push_overlap(&mut extended, interval, extended_start, standard_start);
            push_overlap(&mut extended, interval, standard_end, extended_end);
        }
    }

    TieredIntervals {
        standard: interval::merge(&standard),
        extended: interval::merge(&extended),
    }
}

fn push_overlap(
    out: &mut Vec<TimeInterval>,
    interval: &TimeInterval,
    start: chrono::DateTime<chrono::Utc>,
    end: chrono::DateTime<chrono::Utc>,
) {
    let piece = TimeInterval::non_empty(interval.start().max(start), interval.end().min(end));
    if let Some(piece) = piece {
        out.push(piece);
    }
}
