//! Half-open time interval algebra.
//!
//! Every interval is `[start, end)` with `start < end`, in UTC. Two intervals that
//! merely touch (one ends exactly when the next starts) do not overlap, but
//! [`merge`] still joins them into one contiguous block.
//!
//! Sequences returned by this module are sorted by start and non-overlapping.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A half-open `[start, end)` span of absolute time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct TimeInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawInterval> for TimeInterval {
    type Error = EngineError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        TimeInterval::new(raw.start, raw.end)
    }
}

impl TimeInterval {
    /// Build an interval, rejecting empty or inverted bounds.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        Self::non_empty(start, end).ok_or_else(|| {
            EngineError::InvalidRequest(format!(
                "interval start {} is not before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            ))
        })
    }

    /// Build an interval if `start < end`, otherwise `None`.
    pub fn non_empty(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// True iff the two intervals share at least one instant.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        overlaps(self, other)
    }

    /// True iff `other` lies entirely within `self`.
    pub fn contains(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The shared portion of two intervals, if any.
    pub fn intersection(&self, other: &TimeInterval) -> Option<TimeInterval> {
        Self::non_empty(self.start.max(other.start), self.end.min(other.end))
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Two half-open intervals overlap iff `a.start < b.end && b.start < a.end`.
///
/// Adjacent intervals (`a.end == b.start`) do not overlap.
pub fn overlaps(a: &TimeInterval, b: &TimeInterval) -> bool {
    a.start < b.end && b.start < a.end
}

/// Merge overlapping or adjacent intervals.
///
/// Returns the minimal sorted, non-overlapping sequence covering the same
/// instants. Idempotent: `merge(&merge(x)) == merge(x)`.
pub fn merge(intervals: &[TimeInterval]) -> Vec<TimeInterval> {
    let mut sorted = intervals.to_vec();
    // (start, end) ordering keeps the merge stable.
    sorted.sort();

    let mut merged: Vec<TimeInterval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        if let Some(last) = merged.last_mut() {
            if interval.start <= last.end {
                // Overlapping or adjacent: extend the current block.
                last.end = last.end.max(interval.end);
                continue;
            }
        }
        merged.push(interval);
    }

    merged
}

/// Union of two interval sequences, merged.
pub fn union(a: &[TimeInterval], b: &[TimeInterval]) -> Vec<TimeInterval> {
    let mut all = Vec::with_capacity(a.len() + b.len());
    all.extend_from_slice(a);
    all.extend_from_slice(b);
    merge(&all)
}

/// Free portions of `[window_start, window_end)` not covered by any busy interval.
///
/// Busy intervals need not be sorted or disjoint; they are merged first. Busy
/// intervals entirely outside the window are ignored. A zero-length or inverted
/// window yields an empty result.
pub fn subtract(
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    busy: &[TimeInterval],
) -> Vec<TimeInterval> {
    if window_start >= window_end {
        return Vec::new();
    }

    let mut free = Vec::new();
    let mut cursor = window_start;

    for block in merge(busy) {
        if block.end <= window_start || block.start >= window_end {
            continue;
        }
        if cursor < block.start {
            free.push(TimeInterval {
                start: cursor,
                end: block.start,
            });
        }
        cursor = cursor.max(block.end);
        if cursor >= window_end {
            break;
        }
    }

    // Trailing free time after the last busy block.
    if cursor < window_end {
        free.push(TimeInterval {
            start: cursor,
            end: window_end,
        });
    }

    free
}

/// Pairwise overlap of two interval sequences.
///
/// Both inputs are normalized with [`merge`] first, so the result is sorted and
/// non-overlapping regardless of input order.
pub fn intersect(a: &[TimeInterval], b: &[TimeInterval]) -> Vec<TimeInterval> {
    let a = merge(a);
    let b = merge(b);

    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if let Some(shared) = a[i].intersection(&b[j]) {
            out.push(shared);
        }
        // Advance whichever interval finishes first.
        if a[i].end < b[j].end {
            i += 1;
        } else {
            j += 1;
        }
    }

    out
}

/// True iff some interval in the normalized sequence contains `target` entirely.
pub fn covers(sequence: &[TimeInterval], target: &TimeInterval) -> bool {
    sequence.iter().any(|interval| interval.contains(target))
}

/// Total length of a normalized sequence, in minutes.
pub fn total_minutes(sequence: &[TimeInterval]) -> i64 {
    sequence.iter().map(TimeInterval::duration_minutes).sum()
}

/// Check that a sequence is sorted by start and that no two members overlap.
///
/// Adjacent members are allowed. A violation is an engine bug, reported as
/// [`EngineError::InternalInconsistency`].
pub fn ensure_disjoint(sequence: &[TimeInterval], label: &str) -> Result<()> {
    for pair in sequence.windows(2) {
        if pair[0].end > pair[1].start {
            return Err(EngineError::InternalInconsistency(format!(
                "{label}: {} overlaps or precedes {}",
                pair[0], pair[1]
            )));
        }
    }
    Ok(())
}
