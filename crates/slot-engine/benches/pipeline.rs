use std::hint::black_box;

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use slot_engine::interval::{merge, subtract};
use slot_engine::{
    resolve_local, BusySet, Participant, ResolutionRequest, ScoringPolicy, SearchWindow,
    TimeInterval, WorkingHoursPolicy,
};

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap()
}

/// A deterministic, busy-looking calendar: 40-minute meetings every few hours.
fn calendar(seed: i64, days: i64) -> Vec<TimeInterval> {
    (0..days * 8)
        .filter_map(|i| {
            let start = base() + Duration::minutes(i * 180 + (seed * 37) % 120);
            TimeInterval::non_empty(start, start + Duration::minutes(40))
        })
        .collect()
}

fn bench_interval_algebra(c: &mut Criterion) {
    let mut group = c.benchmark_group("interval_algebra");
    let busy = calendar(3, 14);

    group.bench_function("merge_two_weeks", |b| {
        b.iter(|| merge(black_box(&busy)));
    });
    group.bench_function("subtract_two_weeks", |b| {
        b.iter(|| subtract(base(), base() + Duration::days(14), black_box(&busy)));
    });

    group.finish();
}

fn bench_resolve_local(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_local");
    let policy = WorkingHoursPolicy::default();
    let scoring = ScoringPolicy::default();

    for participants in [2usize, 8, 32] {
        let people: Vec<Participant> = (0..participants)
            .map(|i| {
                let id = format!("p{i}@example.com");
                if i % 2 == 0 {
                    Participant::required(id)
                } else {
                    Participant::optional(id)
                }
            })
            .collect();
        let busy: BusySet = people
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), calendar(i as i64, 7)))
            .collect();
        let request = ResolutionRequest {
            participants: people,
            duration_minutes: 30,
            window: SearchWindow::new(base(), base() + Duration::days(7), "America/New_York")
                .unwrap(),
            max_suggestions: 5,
            minimum_attendee_percentage: 50,
        };

        group.bench_with_input(
            BenchmarkId::new("one_week", participants),
            &request,
            |b, request| {
                b.iter(|| resolve_local(black_box(request), &busy, &policy, &scoring));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_interval_algebra, bench_resolve_local);
criterion_main!(benches);
