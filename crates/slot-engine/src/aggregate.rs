//! Multi-participant feasibility timeline.
//!
//! A period is feasible when every required participant is free and enough of
//! the remaining participants (optional and priority) are free to meet the
//! minimum attendee percentage. Standard-tier feasibility uses only standard
//! working hours; extended-tier feasibility uses standard and extended hours
//! together.
//!
//! Each maximal required-feasible interval is split at every free/busy boundary
//! of the non-required participants, so every emitted interval carries one
//! constant set of satisfied and missing participants.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::interval::{self, TimeInterval};
use crate::model::{NoSlotsReason, Participant};
use crate::working_hours::{Tier, TieredIntervals};

/// A feasible period annotated with who can and cannot attend.
#[derive(Debug, Clone, PartialEq)]
pub struct FeasibleInterval {
    pub interval: TimeInterval,
    pub tier: Tier,
    /// Required participants plus every free optional/priority participant.
    pub satisfied: Vec<Participant>,
    /// Optional/priority participants busy during the interval.
    pub missing: Vec<Participant>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeasibleTimeline {
    /// Sorted by start, then tier.
    pub intervals: Vec<FeasibleInterval>,
    /// Required participants with no free time in any tier.
    pub unavailable: Vec<String>,
}

impl FeasibleTimeline {
    /// Explain an empty selection drawn from this timeline.
    pub fn no_slots_reason(&self) -> NoSlotsReason {
        if !self.intervals.is_empty() {
            NoSlotsReason::DurationTooLongForWindow
        } else if !self.unavailable.is_empty() {
            NoSlotsReason::AllParticipantsUnavailable
        } else {
            NoSlotsReason::NoCommonFreeTime
        }
    }
}

/// Combine per-participant free time into one feasibility timeline.
///
/// Participants missing from `free` are treated as having no free time.
/// Output is a deterministic function of the inputs.
///
/// # Errors
///
/// Returns `EngineError::InternalInconsistency` if the computed timeline is not
/// sorted and disjoint within each tier.
pub fn aggregate(
    free: &BTreeMap<String, TieredIntervals>,
    participants: &[Participant],
    minimum_attendee_percentage: u8,
) -> Result<FeasibleTimeline> {
    let (required, pool): (Vec<&Participant>, Vec<&Participant>) =
        participants.iter().partition(|p| p.is_required());

    let unavailable: Vec<String> = required
        .iter()
        .filter(|p| free_time(free, p).is_empty())
        .map(|p| p.id.clone())
        .collect();

    if required.is_empty() {
        return Ok(FeasibleTimeline {
            intervals: Vec::new(),
            unavailable,
        });
    }

    let standard = intersect_required(&required, free, |t: &TieredIntervals| t.standard.clone());
    // Only keep extended intervals that actually reach outside standard hours;
    // the rest are already represented in the standard tier.
    let extended: Vec<TimeInterval> = intersect_required(&required, free, TieredIntervals::combined)
        .into_iter()
        .filter(|candidate| !interval::covers(&standard, candidate))
        .collect();

    let mut intervals = Vec::new();
    for (tier, timeline) in [(Tier::Standard, &standard), (Tier::Extended, &extended)] {
        let pool_free: Vec<(&Participant, Vec<TimeInterval>)> = pool
            .iter()
            .map(|p| (*p, free_time(free, p).for_tier(tier)))
            .collect();

        for feasible in timeline {
            for (segment, attending) in split_by_attendance(feasible, &pool_free) {
                if !meets_threshold(attending.len(), pool.len(), minimum_attendee_percentage) {
                    continue;
                }
                let satisfied = required
                    .iter()
                    .map(|p| (*p).clone())
                    .chain(attending.iter().map(|p| (*p).clone()))
                    .collect();
                let missing = pool
                    .iter()
                    .filter(|p| !attending.iter().any(|a| a.id == p.id))
                    .map(|p| (*p).clone())
                    .collect();
                intervals.push(FeasibleInterval {
                    interval: segment,
                    tier,
                    satisfied,
                    missing,
                });
            }
        }
    }

    intervals.sort_by(|a, b| a.interval.cmp(&b.interval).then(a.tier.cmp(&b.tier)));

    for tier in [Tier::Standard, Tier::Extended] {
        let sequence: Vec<TimeInterval> = intervals
            .iter()
            .filter(|f| f.tier == tier)
            .map(|f| f.interval)
            .collect();
        interval::ensure_disjoint(&sequence, "feasible timeline")?;
    }

    Ok(FeasibleTimeline {
        intervals,
        unavailable,
    })
}

static NO_FREE_TIME: TieredIntervals = TieredIntervals {
    standard: Vec::new(),
    extended: Vec::new(),
};

fn free_time<'a>(
    free: &'a BTreeMap<String, TieredIntervals>,
    participant: &Participant,
) -> &'a TieredIntervals {
    free.get(&participant.id).unwrap_or(&NO_FREE_TIME)
}

/// Intersection of the chosen free sequence across all required participants.
fn intersect_required(
    required: &[&Participant],
    free: &BTreeMap<String, TieredIntervals>,
    select: impl Fn(&TieredIntervals) -> Vec<TimeInterval>,
) -> Vec<TimeInterval> {
    let mut iter = required.iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };
    let mut common = select(free_time(free, first));
    for participant in iter {
        if common.is_empty() {
            break;
        }
        common = interval::intersect(&common, &select(free_time(free, participant)));
    }
    common
}

/// Split `feasible` into segments over which the set of free pool members is constant.
fn split_by_attendance<'p>(
    feasible: &TimeInterval,
    pool_free: &[(&'p Participant, Vec<TimeInterval>)],
) -> Vec<(TimeInterval, Vec<&'p Participant>)> {
    let mut cuts: Vec<DateTime<Utc>> = vec![feasible.start(), feasible.end()];
    for (_, free) in pool_free {
        for block in free {
            for edge in [block.start(), block.end()] {
                if feasible.start() < edge && edge < feasible.end() {
                    cuts.push(edge);
                }
            }
        }
    }
    cuts.sort();
    cuts.dedup();

    let mut segments: Vec<(TimeInterval, Vec<&'p Participant>)> = Vec::new();
    for pair in cuts.windows(2) {
        let Some(segment) = TimeInterval::non_empty(pair[0], pair[1]) else {
            continue;
        };
        let attending: Vec<&'p Participant> = pool_free
            .iter()
            .filter(|(_, free)| interval::covers(free, &segment))
            .map(|(p, _)| *p)
            .collect();

        // Coalesce with the previous segment when attendance is unchanged.
        if let Some((last, last_attending)) = segments.last_mut() {
            if *last_attending == attending && last.end() == segment.start() {
                if let Some(joined) = TimeInterval::non_empty(last.start(), segment.end()) {
                    *last = joined;
                    continue;
                }
            }
        }
        segments.push((segment, attending));
    }

    segments
}

/// `attending / pool >= percentage / 100`, with an empty pool always satisfied.
fn meets_threshold(attending: usize, pool: usize, percentage: u8) -> bool {
    pool == 0 || attending * 100 >= usize::from(percentage) * pool
}
