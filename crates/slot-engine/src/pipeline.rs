//! The local resolution pipeline: free time per participant, aggregation, ranking.
//!
//! Pure and synchronous. Safe to call concurrently for independent requests.

use crate::aggregate;
use crate::error::{EngineError, Result};
use crate::model::{CandidateSlot, ResolutionRequest, ResolutionResult};
use crate::ranking::{self, ScoringPolicy};
use crate::resolver::{self, BusySet};
use crate::working_hours::WorkingHoursPolicy;

/// Resolve `request` against already-gathered busy data.
///
/// The request must already have passed [`ResolutionRequest::validate`].
/// Participants absent from `busy` are treated as fully free.
///
/// # Errors
/// Returns `EngineError::InternalInconsistency` if an intermediate result or a
/// produced candidate breaks an engine invariant.
pub fn resolve_local(
    request: &ResolutionRequest,
    busy: &BusySet,
    default_policy: &WorkingHoursPolicy,
    scoring: &ScoringPolicy,
) -> Result<ResolutionResult> {
    let policy = request.window.policy(default_policy);
    let free = resolver::resolve_all(&request.participants, busy, &request.window, policy);
    let timeline = aggregate::aggregate(
        &free,
        &request.participants,
        request.minimum_attendee_percentage,
    )?;

    let suggestions = ranking::select(
        &timeline,
        request.duration_minutes,
        &request.priority(),
        request.max_suggestions,
        scoring,
    );

    for slot in &suggestions {
        check_candidate(request, slot)?;
    }

    if suggestions.is_empty() {
        Ok(ResolutionResult::no_slots(timeline.no_slots_reason()))
    } else {
        Ok(ResolutionResult::success(suggestions))
    }
}

/// True iff `slot` lies inside the request window and lasts exactly the
/// requested duration.
pub fn is_well_formed(request: &ResolutionRequest, slot: &CandidateSlot) -> bool {
    slot.interval.start() >= request.window.start
        && slot.interval.end() <= request.window.end
        && slot.interval.duration() == request.duration()
}

fn check_candidate(request: &ResolutionRequest, slot: &CandidateSlot) -> Result<()> {
    if is_well_formed(request, slot) {
        Ok(())
    } else {
        Err(EngineError::InternalInconsistency(format!(
            "candidate {} is outside the window or not {} minutes long",
            slot.interval, request.duration_minutes
        )))
    }
}
