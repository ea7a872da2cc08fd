//! Property-based tests for the interval algebra using proptest.
//!
//! These verify invariants that hold for *any* interval input, not just the
//! examples in `interval_tests.rs`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use slot_engine::interval::{intersect, merge, overlaps, subtract, union};
use slot_engine::TimeInterval;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap()
}

/// An interval inside a two-day span, on a 5-minute grid.
fn arb_interval() -> impl Strategy<Value = TimeInterval> {
    (0i64..576, 1i64..48).prop_map(|(start, len)| {
        let start = base() + Duration::minutes(start * 5);
        TimeInterval::new(start, start + Duration::minutes(len * 5)).unwrap()
    })
}

fn arb_intervals() -> impl Strategy<Value = Vec<TimeInterval>> {
    prop::collection::vec(arb_interval(), 0..20)
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

fn is_normalized(sequence: &[TimeInterval]) -> bool {
    sequence.windows(2).all(|pair| pair[0].end() < pair[1].start())
}

// ---------------------------------------------------------------------------
// Property 1: merge is idempotent and normalized
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn merge_is_idempotent(intervals in arb_intervals()) {
        let once = merge(&intervals);
        prop_assert_eq!(merge(&once), once.clone());
        prop_assert!(is_normalized(&once), "not normalized: {:?}", once);
    }
}

// ---------------------------------------------------------------------------
// Property 2: subtract never returns time covered by busy intervals
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn subtract_is_disjoint_from_busy(window in arb_interval(), busy in arb_intervals()) {
        let free = subtract(window.start(), window.end(), &busy);
        for slot in &free {
            prop_assert!(window.contains(slot));
            for block in &busy {
                prop_assert!(!overlaps(slot, block), "{} overlaps busy {}", slot, block);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: free ∪ (busy ∩ window) recovers the window exactly
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn subtract_round_trips_with_busy_portion(window in arb_interval(), busy in arb_intervals()) {
        let free = subtract(window.start(), window.end(), &busy);
        let busy_inside = intersect(&busy, &[window]);

        // Re-adding the busy portion recovers the whole window.
        let recovered = intersect(&union(&free, &busy_inside), &[window]);
        prop_assert_eq!(recovered, vec![window]);

        // Complementing the free time recovers exactly the busy portion.
        let complement = subtract(window.start(), window.end(), &free);
        prop_assert_eq!(complement, busy_inside);
    }
}

// ---------------------------------------------------------------------------
// Property 4: intersect is commutative and contained in both operands
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn intersect_is_commutative(a in arb_intervals(), b in arb_intervals()) {
        let ab = intersect(&a, &b);
        prop_assert_eq!(ab.clone(), intersect(&b, &a));
        prop_assert_eq!(intersect(&ab, &a), ab.clone());
        prop_assert_eq!(intersect(&ab, &b), ab);
    }
}

// ---------------------------------------------------------------------------
// Property 5: half-open boundary, abutting busy never shortens free time
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn abutting_busy_keeps_free_length(window in arb_interval(), before in 1i64..120) {
        let busy =
            TimeInterval::new(window.start() - Duration::minutes(before), window.start()).unwrap();
        let free = subtract(window.start(), window.end(), &[busy]);
        prop_assert_eq!(free, vec![window]);
    }
}
