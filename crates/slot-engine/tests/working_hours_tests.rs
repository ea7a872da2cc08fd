//! Tests for working-hours tier projection.

use chrono::{DateTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use slot_engine::working_hours::apply;
use slot_engine::{EngineError, Tier, TimeInterval, WorkingHoursPolicy};

fn utc(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, min, 0).unwrap()
}

fn iv(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeInterval {
    TimeInterval::new(start, end).unwrap()
}

fn tz(name: &str) -> Tz {
    name.parse().unwrap()
}

// ── Policy ──────────────────────────────────────────────────────────────────

#[test]
fn default_policy_matches_documented_hours() {
    let policy = WorkingHoursPolicy::default();
    assert_eq!(policy.standard_start_hour, 9);
    assert_eq!(policy.standard_end_hour, 18);
    assert_eq!(policy.extended_start_hour, 7);
    assert_eq!(policy.extended_end_hour, 23);
    assert!(policy.is_excluded(Weekday::Sat));
    assert!(policy.is_excluded(Weekday::Sun));
    assert!(!policy.is_excluded(Weekday::Mon));
    assert_eq!(policy.standard_span_minutes(), 540);
    assert_eq!(policy.extended_span_minutes(), 960);
    assert!(policy.validate().is_ok());
}

#[test]
fn out_of_order_policy_is_rejected() {
    let policy = WorkingHoursPolicy {
        extended_start_hour: 10,
        ..WorkingHoursPolicy::default()
    };
    assert!(matches!(policy.validate(), Err(EngineError::InvalidRequest(_))));

    let policy = WorkingHoursPolicy {
        extended_end_hour: 25,
        ..WorkingHoursPolicy::default()
    };
    assert!(policy.validate().is_err());
}

#[test]
fn policy_deserializes_with_partial_fields() {
    let policy: WorkingHoursPolicy =
        serde_json::from_str(r#"{"standardStartHour":8,"excludedWeekdays":["Fri"]}"#).unwrap();
    assert_eq!(policy.standard_start_hour, 8);
    assert_eq!(policy.standard_end_hour, 18);
    assert_eq!(policy.excluded_weekdays, vec![Weekday::Fri]);
}

// ── Projection ──────────────────────────────────────────────────────────────

#[test]
fn whole_weekday_splits_into_three_pieces() {
    // Monday 2026-03-16, free all day in UTC.
    let free = vec![iv(utc(16, 0, 0), utc(17, 0, 0))];
    let tiers = apply(&free, &WorkingHoursPolicy::default(), &tz("UTC"));

    assert_eq!(tiers.standard, vec![iv(utc(16, 9, 0), utc(16, 18, 0))]);
    assert_eq!(
        tiers.extended,
        vec![
            iv(utc(16, 7, 0), utc(16, 9, 0)),
            iv(utc(16, 18, 0), utc(16, 23, 0)),
        ]
    );
    assert_eq!(
        tiers.combined(),
        vec![iv(utc(16, 7, 0), utc(16, 23, 0))]
    );
    assert_eq!(tiers.for_tier(Tier::Standard), tiers.standard);
}

#[test]
fn weekend_days_are_dropped() {
    // Saturday 14th and Sunday 15th.
    let free = vec![iv(utc(14, 0, 0), utc(16, 0, 0))];
    let tiers = apply(&free, &WorkingHoursPolicy::default(), &tz("UTC"));
    assert!(tiers.is_empty());
}

#[test]
fn interval_inside_standard_hours_is_kept_whole() {
    let free = vec![iv(utc(16, 10, 15), utc(16, 11, 45))];
    let tiers = apply(&free, &WorkingHoursPolicy::default(), &tz("UTC"));
    assert_eq!(tiers.standard, free);
    assert!(tiers.extended.is_empty());
}

#[test]
fn multi_day_interval_walks_each_day() {
    // Monday 12:00 → Wednesday 08:00 UTC.
    let free = vec![iv(utc(16, 12, 0), utc(18, 8, 0))];
    let tiers = apply(&free, &WorkingHoursPolicy::default(), &tz("UTC"));

    assert_eq!(
        tiers.standard,
        vec![
            iv(utc(16, 12, 0), utc(16, 18, 0)),
            iv(utc(17, 9, 0), utc(17, 18, 0)),
        ]
    );
    assert_eq!(
        tiers.extended,
        vec![
            iv(utc(16, 18, 0), utc(16, 23, 0)),
            iv(utc(17, 7, 0), utc(17, 9, 0)),
            iv(utc(17, 18, 0), utc(17, 23, 0)),
            iv(utc(18, 7, 0), utc(18, 8, 0)),
        ]
    );
}

#[test]
fn boundaries_follow_the_window_timezone() {
    // Monday 2026-03-16 in New York is EDT (UTC-4): 09:00 local = 13:00 UTC.
    let free = vec![iv(utc(16, 0, 0), utc(17, 6, 0))];
    let tiers = apply(&free, &WorkingHoursPolicy::default(), &tz("America/New_York"));
    assert_eq!(tiers.standard, vec![iv(utc(16, 13, 0), utc(16, 22, 0))]);
}

#[test]
fn utc_sunday_can_be_a_local_monday() {
    // Sunday 15th 23:00 UTC is Monday 08:00 in Tokyo (UTC+9): extended time.
    let free = vec![iv(utc(15, 22, 0), utc(16, 1, 0))];
    let tiers = apply(&free, &WorkingHoursPolicy::default(), &tz("Asia/Tokyo"));
    // Monday 07:00-09:00 JST = Sunday 22:00-24:00 UTC.
    assert_eq!(tiers.extended, vec![iv(utc(15, 22, 0), utc(16, 0, 0))]);
    // Monday 09:00-10:00 JST = Monday 00:00-01:00 UTC.
    assert_eq!(tiers.standard, vec![iv(utc(16, 0, 0), utc(16, 1, 0))]);
}

#[test]
fn tiers_never_overlap_each_other() {
    let free = vec![iv(utc(16, 0, 0), utc(21, 0, 0))];
    let tiers = apply(&free, &WorkingHoursPolicy::default(), &tz("Europe/Berlin"));
    for s in &tiers.standard {
        for e in &tiers.extended {
            assert!(!s.overlaps(e), "{} overlaps {}", s, e);
        }
    }
}

#[test]
fn custom_policy_with_midnight_end() {
    let policy = WorkingHoursPolicy {
        standard_start_hour: 8,
        standard_end_hour: 20,
        extended_start_hour: 0,
        extended_end_hour: 24,
        excluded_weekdays: vec![],
    };
    // Saturday is no longer excluded; full day is extended + standard.
    let free = vec![iv(utc(14, 0, 0), utc(15, 0, 0))];
    let tiers = apply(&free, &policy, &tz("UTC"));
    assert_eq!(tiers.standard, vec![iv(utc(14, 8, 0), utc(14, 20, 0))]);
    assert_eq!(tiers.combined(), free);
}
