//! # slot-engine
//!
//! Deterministic availability resolution for multi-participant meeting scheduling.
//!
//! Given per-participant busy intervals, a meeting duration, a search window and a
//! working-hours policy, the engine computes every feasible meeting slot, ranks
//! the candidates, and explains why there are none when there are none. All of it
//! is pure, synchronous computation over already-gathered calendar data.
//!
//! ## Modules
//!
//! - [`interval`]: half-open interval algebra: overlap, merge, subtract, intersect
//! - [`working_hours`]: split free time into standard and extended tiers
//! - [`resolver`]: one participant's tiered free time inside a window
//! - [`aggregate`]: combine participants into a feasibility timeline
//! - [`ranking`]: slice, score and order candidate slots
//! - [`pipeline`]: the full local pipeline with invariant checks
//! - [`recurrence`]: expand recurring commitments (RRULE) into busy intervals
//! - [`dst`]: wall-clock to instant resolution across DST transitions
//! - [`model`]: request, participant, candidate and result types
//! - [`error`]: error types

pub mod aggregate;
pub mod dst;
pub mod error;
pub mod interval;
pub mod model;
pub mod pipeline;
pub mod ranking;
pub mod recurrence;
pub mod resolver;
pub mod working_hours;

pub use aggregate::{aggregate, FeasibleInterval, FeasibleTimeline};
pub use error::EngineError;
pub use interval::TimeInterval;
pub use model::{
    CandidateSlot, NoSlotsReason, Participant, ResolutionRequest, ResolutionResult,
    ResolutionStatus, Role, SearchWindow,
};
pub use pipeline::resolve_local;
pub use ranking::{select, ExtendedHoursMode, ScoringPolicy};
pub use resolver::BusySet;
pub use working_hours::{Tier, TieredIntervals, WorkingHoursPolicy};
