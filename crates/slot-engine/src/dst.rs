//! Wall-clock to instant resolution across DST transitions.
//!
//! Working-hours boundaries are wall-clock times ("09:00 in Europe/Berlin") that
//! must become absolute instants. Around DST transitions a wall-clock time can
//! occur twice (fall back) or not at all (spring forward).

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::error::{EngineError, Result};

/// Parse an IANA timezone identifier (e.g. "America/Los_Angeles").
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| EngineError::InvalidTimezone(name.to_string()))
}

/// Resolve a local wall-clock time in `tz` to a UTC instant.
///
/// Ambiguous times resolve to the earliest instant. Times inside a gap are
/// interpreted with the offset in effect before the gap, which shifts them
/// forward by the length of the gap (02:30 during a one-hour spring-forward
/// becomes 03:30).
pub fn resolve_wall_clock(tz: &Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let before = tz
                .offset_from_utc_datetime(&(local - Duration::days(1)))
                .fix();
            (local - Duration::seconds(i64::from(before.local_minus_utc()))).and_utc()
        }
    }
}

/// The instant at which `hour:00` occurs on `date` in `tz`.
///
/// `hour == 24` is the midnight that ends `date`.
pub fn day_boundary(tz: &Tz, date: NaiveDate, hour: u32) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN) + Duration::hours(i64::from(hour));
    resolve_wall_clock(tz, local)
}
