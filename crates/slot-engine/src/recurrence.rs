//! Recurring commitments: RRULE expansion into busy intervals.
//!
//! Wraps the `rrule` crate (v0.13) so a calendar store can describe a weekly
//! stand-up once and still contribute every occurrence that touches the search
//! window. DST is handled by expanding in the rule's own timezone.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rrule::{RRuleSet, Tz};

use crate::dst::{parse_timezone, resolve_wall_clock};
use crate::error::{EngineError, Result};
use crate::interval::TimeInterval;

/// Upper bound on occurrences expanded for one rule inside one window.
const MAX_OCCURRENCES: u16 = 1000;

/// A recurring commitment as stored by a calendar source.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringCommitment<'a> {
    /// RFC 5545 RRULE body, e.g. "FREQ=WEEKLY;BYDAY=TU,TH".
    pub rrule: &'a str,
    /// Local start of the first occurrence, e.g. "2026-02-17T14:00:00".
    pub dtstart: &'a str,
    pub duration_minutes: u32,
    /// IANA timezone the rule is anchored in.
    pub timezone: &'a str,
    /// Local datetimes (same format as `dtstart`) excluded from the series.
    pub exdates: &'a [&'a str],
}

/// Expand a recurring commitment into the busy intervals that overlap
/// `[window_start, window_end)`.
///
/// A rule with neither COUNT nor UNTIL is bounded at the window end so
/// open-ended series expand only as far as needed. Occurrences that end
/// before the window are skipped without counting toward the expansion cap,
/// so a series that started years ago still contributes its recent dates.
///
/// # Errors
/// Returns `EngineError::InvalidRule` if the RRULE string is empty or
/// unparseable, or if more occurrences overlap the window than can be
/// expanded.
/// Returns `EngineError::InvalidTimezone` if the timezone is not a valid
/// IANA identifier.
pub fn expand_busy(
    commitment: &RecurringCommitment<'_>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<TimeInterval>> {
    if commitment.rrule.trim().is_empty() {
        return Err(EngineError::InvalidRule("empty RRULE string".to_string()));
    }
    if commitment.duration_minutes == 0 || window_start >= window_end {
        return Ok(Vec::new());
    }

    let tz = parse_timezone(commitment.timezone)?;

    let first = NaiveDateTime::parse_from_str(commitment.dtstart, "%Y-%m-%dT%H:%M:%S")
        .map_err(|e| {
            EngineError::InvalidRule(format!("invalid DTSTART '{}': {}", commitment.dtstart, e))
        })?;
    // An injected UNTIL before DTSTART is rejected by the rrule crate.
    if resolve_wall_clock(&tz, first) >= window_end {
        return Ok(Vec::new());
    }

    // "2026-02-17T14:00:00" -> "20260217T140000"
    let dtstart_ical = commitment.dtstart.replace(['-', ':'], "");

    let mut rule = commitment.rrule.to_string();
    let upper = rule.to_uppercase();
    if !upper.contains("COUNT=") && !upper.contains("UNTIL=") {
        // The rrule crate requires UNTIL in the same zone as DTSTART: a "Z"
        // suffix for UTC, bare local time otherwise.
        let mut until = window_end
            .with_timezone(&tz)
            .naive_local()
            .format("%Y%m%dT%H%M%S")
            .to_string();
        if commitment.timezone == "UTC" {
            until.push('Z');
        }
        rule = format!("{rule};UNTIL={until}");
    }

    let mut text = format!(
        "DTSTART;TZID={}:{}\nRRULE:{}",
        commitment.timezone, dtstart_ical, rule
    );
    if !commitment.exdates.is_empty() {
        let exdates: Vec<String> = commitment
            .exdates
            .iter()
            .map(|d| d.replace(['-', ':'], ""))
            .collect();
        text.push_str(&format!(
            "\nEXDATE;TZID={}:{}",
            commitment.timezone,
            exdates.join(",")
        ));
    }

    let set: RRuleSet = text
        .parse()
        .map_err(|e| EngineError::InvalidRule(format!("{}", e)))?;

    let length = Duration::minutes(i64::from(commitment.duration_minutes));
    // Both bounds are inclusive; an occurrence starting exactly at the window
    // end is dropped by the overlap filter below.
    let expansion = set
        .after((window_start - length).with_timezone(&Tz::UTC))
        .before(window_end.with_timezone(&Tz::UTC))
        .all(MAX_OCCURRENCES);
    if expansion.limited {
        return Err(EngineError::InvalidRule(format!(
            "'{}' has {} or more occurrences inside the window",
            commitment.rrule, MAX_OCCURRENCES
        )));
    }

    let busy = expansion
        .dates
        .into_iter()
        .filter_map(|occurrence| {
            let start = occurrence.with_timezone(&Utc);
            TimeInterval::non_empty(start, start + length)
        })
        .filter(|busy| busy.start() < window_end && busy.end() > window_start)
        .collect();

    Ok(busy)
}
