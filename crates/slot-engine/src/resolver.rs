//! Per-participant free time: window minus busy intervals, projected onto working hours.

use std::collections::BTreeMap;

use crate::interval::{self, TimeInterval};
use crate::model::{Participant, SearchWindow};
use crate::working_hours::{self, TieredIntervals, WorkingHoursPolicy};

/// Busy intervals per participant, normalized on insert.
///
/// Keyed by participant identity, so iteration order never depends on the
/// order in which calendars were gathered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusySet {
    calendars: BTreeMap<String, Vec<TimeInterval>>,
}

impl BusySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `participant`'s busy intervals, replacing any previous entry.
    pub fn insert(&mut self, participant: impl Into<String>, busy: &[TimeInterval]) {
        self.calendars.insert(participant.into(), interval::merge(busy));
    }

    /// A participant's merged busy intervals.
    ///
    /// A participant with no entry is treated as fully free.
    pub fn get(&self, participant: &str) -> &[TimeInterval] {
        self.calendars
            .get(participant)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, participant: &str) -> bool {
        self.calendars.contains_key(participant)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TimeInterval])> {
        self.calendars
            .iter()
            .map(|(id, busy)| (id.as_str(), busy.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }
}

impl FromIterator<(String, Vec<TimeInterval>)> for BusySet {
    fn from_iter<I: IntoIterator<Item = (String, Vec<TimeInterval>)>>(iter: I) -> Self {
        let mut set = BusySet::new();
        for (participant, busy) in iter {
            set.insert(participant, &busy);
        }
        set
    }
}

/// Free time for one participant inside `window`, split by tier.
pub fn resolve(
    participant: &str,
    busy: &BusySet,
    window: &SearchWindow,
    policy: &WorkingHoursPolicy,
) -> TieredIntervals {
    let free = interval::subtract(window.start, window.end, busy.get(participant));
    working_hours::apply(&free, policy, &window.timezone)
}

/// [`resolve`] for every participant, keyed by identifier.
pub fn resolve_all(
    participants: &[Participant],
    busy: &BusySet,
    window: &SearchWindow,
    policy: &WorkingHoursPolicy,
) -> BTreeMap<String, TieredIntervals> {
    participants
        .iter()
        .map(|p| (p.id.clone(), resolve(&p.id, busy, window, policy)))
        .collect()
}
