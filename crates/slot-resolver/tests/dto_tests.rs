//! Tests for boundary normalization: durations, timestamps, wire requests and
//! responses, provider response parsing and configuration loading.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use slot_engine::{
    CandidateSlot, NoSlotsReason, Participant, ResolutionResult, Tier, TimeInterval,
};
use slot_resolver::dto::{DurationValue, ResponseStatus};
use slot_resolver::provider::{parse_response, DEFAULT_PROVIDER_SCORE};
use slot_resolver::{
    parse_duration, parse_timestamp, ProviderError, ResolveError, ResolveRequest, ResolveResponse,
    ResolverConfig,
};

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn wire(json: &str) -> ResolveRequest {
    serde_json::from_str(json).unwrap()
}

// ---------------------------------------------------------------------------
// Durations
// ---------------------------------------------------------------------------

#[test]
fn duration_forms() {
    for (text, minutes) in [
        ("45", 45),
        ("30m", 30),
        ("30 min", 30),
        ("90 minutes", 90),
        ("1h", 60),
        ("1.5h", 90),
        ("2 hours", 120),
        ("1h30m", 90),
        ("1 hr 15 mins", 75),
        ("PT30M", 30),
        ("PT1H30M", 90),
        ("  pt2h ", 120),
    ] {
        assert_eq!(parse_duration(text).unwrap(), minutes, "parsing {text:?}");
    }
}

#[test]
fn invalid_durations_are_rejected() {
    for text in ["", "soon", "0", "-15", "PT", "10 parsecs", "h30"] {
        assert!(
            matches!(parse_duration(text), Err(ResolveError::InvalidRequest(_))),
            "{text:?} should be rejected"
        );
    }
}

#[test]
fn duration_value_accepts_number_or_text() {
    let number: DurationValue = serde_json::from_str("45").unwrap();
    let text: DurationValue = serde_json::from_str(r#""1h""#).unwrap();
    assert_eq!(number.minutes().unwrap(), 45);
    assert_eq!(text.minutes().unwrap(), 60);
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

#[test]
fn rfc3339_timestamps_keep_their_offset() {
    let tz: Tz = "Asia/Tokyo".parse().unwrap();
    assert_eq!(
        parse_timestamp("2026-03-16T09:00:00+01:00", &tz).unwrap(),
        utc(2026, 3, 16, 8, 0)
    );
    assert_eq!(
        parse_timestamp("2026-03-16T09:00:00Z", &tz).unwrap(),
        utc(2026, 3, 16, 9, 0)
    );
}

#[test]
fn naive_timestamps_are_read_in_the_request_zone() {
    let tz: Tz = "America/New_York".parse().unwrap();
    for text in [
        "2026-03-16T09:00:00",
        "2026-03-16T09:00",
        "2026-03-16 09:00:00",
        "2026-03-16T09:00:00.000",
    ] {
        assert_eq!(parse_timestamp(text, &tz).unwrap(), utc(2026, 3, 16, 13, 0));
    }
}

#[test]
fn naive_timestamp_in_dst_gap_moves_forward() {
    let tz: Tz = "America/New_York".parse().unwrap();
    // 02:30 does not exist on 2026-03-08; it reads as 03:30 EDT.
    assert_eq!(
        parse_timestamp("2026-03-08T02:30:00", &tz).unwrap(),
        utc(2026, 3, 8, 7, 30)
    );
}

#[test]
fn garbage_timestamp_is_rejected() {
    assert!(parse_timestamp("next tuesday", &Tz::UTC).is_err());
}

// ---------------------------------------------------------------------------
// Wire request normalization
// ---------------------------------------------------------------------------

#[test]
fn omitted_fields_take_configured_defaults() {
    let config = ResolverConfig {
        default_duration_minutes: 25,
        default_max_suggestions: 3,
        default_minimum_attendee_percentage: 50,
        ..ResolverConfig::default()
    };
    let request = wire(
        r#"{"participants": [{"id": "a@x.com"}],
            "windowStart": "2026-03-16T09:00:00Z", "windowEnd": "2026-03-16T17:00:00Z"}"#,
    )
    .into_request(&config)
    .unwrap();

    assert_eq!(request.duration_minutes, 25);
    assert_eq!(request.max_suggestions, 3);
    assert_eq!(request.minimum_attendee_percentage, 50);
    assert_eq!(request.window.timezone, Tz::UTC);
    assert_eq!(request.participants, vec![Participant::required("a@x.com")]);
}

#[test]
fn request_fields_override_defaults() {
    let request = wire(
        r#"{"participants": [{"email": "a@x.com", "role": "priority"}],
            "durationMinutes": "PT45M",
            "windowStart": "2026-03-16T09:00:00", "windowEnd": "2026-03-16T17:00:00",
            "timezone": "Europe/Berlin",
            "minimumAttendeePercentage": 75,
            "maxSuggestions": 10,
            "workingHours": {"standardStartHour": 8}}"#,
    )
    .into_request(&ResolverConfig::default())
    .unwrap();

    assert_eq!(request.duration_minutes, 45);
    assert_eq!(request.max_suggestions, 10);
    assert_eq!(request.minimum_attendee_percentage, 75);
    assert_eq!(request.window.start, utc(2026, 3, 16, 8, 0));
    assert_eq!(request.participants, vec![Participant::priority("a@x.com")]);
    assert_eq!(
        request.window.working_hours.map(|p| p.standard_start_hour),
        Some(8)
    );
}

#[test]
fn out_of_range_percentage_is_rejected() {
    let err = wire(
        r#"{"participants": [{"id": "a@x.com"}], "minimumAttendeePercentage": 150,
            "windowStart": "2026-03-16T09:00:00Z", "windowEnd": "2026-03-16T17:00:00Z"}"#,
    )
    .into_request(&ResolverConfig::default())
    .unwrap_err();
    assert!(matches!(err, ResolveError::InvalidRequest(_)));
}

#[test]
fn unknown_timezone_is_rejected() {
    let err = wire(
        r#"{"participants": [{"id": "a@x.com"}], "timezone": "Mars/Olympus",
            "windowStart": "2026-03-16T09:00:00Z", "windowEnd": "2026-03-16T17:00:00Z"}"#,
    )
    .into_request(&ResolverConfig::default())
    .unwrap_err();
    assert!(matches!(err, ResolveError::InvalidRequest(_)));
}

// ---------------------------------------------------------------------------
// Wire response
// ---------------------------------------------------------------------------

#[test]
fn success_response_lists_attendee_ids() {
    let slot = CandidateSlot {
        interval: TimeInterval::new(utc(2026, 3, 16, 10, 0), utc(2026, 3, 16, 10, 30)).unwrap(),
        tier: Tier::Extended,
        attendees_satisfied: vec![Participant::required("a@x.com")],
        attendees_missing: vec![Participant::optional("b@x.com")],
        score: 50.0,
        confidence: 50.0,
    };
    let result = ResolutionResult::success(vec![slot]).with_warnings(vec!["w".to_string()]);
    let response = ResolveResponse::from(&result);

    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(response.suggestions[0].attendees, vec!["a@x.com"]);
    assert_eq!(response.suggestions[0].missing_attendees, vec!["b@x.com"]);
    assert_eq!(response.warnings, vec!["w"]);
    assert!(response.reason.is_none());

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["suggestions"][0]["tier"], "extended");
    assert!(json.get("reason").is_none());
}

#[test]
fn no_slots_response_carries_code_and_detail() {
    let result = ResolutionResult::no_slots(NoSlotsReason::DurationTooLongForWindow);
    let response = ResolveResponse::from(&result);

    assert_eq!(response.status, ResponseStatus::NoSlots);
    assert_eq!(response.reason.as_deref(), Some("duration_too_long_for_window"));
    assert!(response.detail.is_some());
    assert!(response.suggestions.is_empty());
}

// ---------------------------------------------------------------------------
// Provider responses
// ---------------------------------------------------------------------------

#[test]
fn direct_provider_response_is_parsed() {
    let body = r#"{
        "status": "success",
        "suggested_slots": [
            {"start_time": "2026-03-16T14:00:00Z", "end_time": "2026-03-16T14:30:00Z",
             "attendees_included": ["a@x.com"], "missing_attendees": ["b@x.com"],
             "score": 88, "confidence": 70},
            {"start_time": "2026-03-16T16:00:00", "end_time": "2026-03-16T16:30:00"}
        ],
        "reasoning_summary": "afternoons are quiet"
    }"#;
    let tz: Tz = "Europe/London".parse().unwrap();
    let slots = parse_response(body, &tz).unwrap();

    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].score, 88.0);
    assert_eq!(slots[0].confidence, 70.0);
    assert_eq!(slots[0].missing_attendees, vec!["b@x.com"]);
    // Naive times are local; London is on GMT in mid-March.
    assert_eq!(slots[1].interval.start(), utc(2026, 3, 16, 16, 0));
    assert_eq!(slots[1].score, DEFAULT_PROVIDER_SCORE);
    assert_eq!(slots[1].confidence, DEFAULT_PROVIDER_SCORE);
}

#[test]
fn embedded_provider_response_is_unwrapped() {
    let inner = r#"```json
{"status": "success", "suggested_slots": [
  {"start_time": "2026-03-16T14:00:00Z", "end_time": "2026-03-16T15:00:00Z"}
]}
```"#;
    let body = serde_json::json!({"output": [{"content": [{"text": inner}]}]}).to_string();

    let slots = parse_response(&body, &Tz::UTC).unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].interval.duration_minutes(), 60);
}

#[test]
fn provider_reporting_no_slots_is_empty() {
    let body =
        r#"{"status": "no_slots_available", "suggested_slots": [], "reasoning_summary": "busy"}"#;
    assert_eq!(parse_response(body, &Tz::UTC), Err(ProviderError::Empty));
}

#[test]
fn unusable_provider_slots_are_skipped() {
    let body = r#"{"status": "success", "suggested_slots": [
        {"start_time": "whenever", "end_time": "2026-03-16T14:30:00Z"},
        {"start_time": "2026-03-16T15:00:00Z", "end_time": "2026-03-16T14:30:00Z"},
        {"start_time": "2026-03-16T15:00:00Z", "end_time": "2026-03-16T15:30:00Z"}
    ]}"#;
    let slots = parse_response(body, &Tz::UTC).unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].interval.start(), utc(2026, 3, 16, 15, 0));

    let all_bad = r#"{"status": "success", "suggested_slots": [
        {"start_time": "whenever", "end_time": "later"}
    ]}"#;
    assert!(matches!(
        parse_response(all_bad, &Tz::UTC),
        Err(ProviderError::Malformed(_))
    ));
}

#[test]
fn unrecognizable_provider_body_is_malformed() {
    for body in [
        "not json",
        "{}",
        r#"{"output": []}"#,
        r#"{"output": [{"content": [{"text": "hello"}]}]}"#,
    ] {
        assert!(
            matches!(parse_response(body, &Tz::UTC), Err(ProviderError::Malformed(_))),
            "{body:?} should be malformed"
        );
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn partial_config_fills_defaults() {
    let config = ResolverConfig::from_json(
        r#"{
            "gatherDeadlineMs": 2500,
            "scoring": {"extendedHours": "never"},
            "retry": {"maxAttempts": 1}
        }"#,
    )
    .unwrap();

    assert_eq!(config.gather_deadline_ms, 2_500);
    assert_eq!(config.max_concurrent_fetches, 8);
    assert_eq!(config.retry.max_attempts, 1);
    assert_eq!(config.retry.base_delay_ms, 200);
    assert_eq!(
        config.scoring.extended_hours,
        slot_engine::ExtendedHoursMode::Never
    );
    assert_eq!(config.working_hours, slot_engine::WorkingHoursPolicy::default());
}

#[test]
fn invalid_config_is_rejected() {
    for json in [
        r#"{"maxConcurrentFetches": 0}"#,
        r#"{"gatherDeadlineMs": 0}"#,
        r#"{"defaultMinimumAttendeePercentage": 101}"#,
        r#"{"workingHours": {"standardStartHour": 19}}"#,
        "not json",
    ] {
        assert!(
            matches!(ResolverConfig::from_json(json), Err(ResolveError::Config(_))),
            "{json} should be rejected"
        );
    }
}

#[test]
fn overrides_apply_on_top_of_file_values() {
    let mut config = ResolverConfig::default();
    config
        .apply_overrides(|key| match key {
            "MEETSLOT_PROVIDER_URL" => Some("http://localhost:8080/suggest".to_string()),
            "MEETSLOT_GATHER_DEADLINE_MS" => Some("750".to_string()),
            _ => None,
        })
        .unwrap();

    assert_eq!(
        config.provider_url.as_deref(),
        Some("http://localhost:8080/suggest")
    );
    assert_eq!(config.gather_deadline_ms, 750);
    assert_eq!(config.max_concurrent_fetches, 8);

    config
        .apply_overrides(|key| (key == "MEETSLOT_PROVIDER_URL").then(String::new))
        .unwrap();
    assert!(config.provider_url.is_none());
}

#[test]
fn bad_override_is_rejected() {
    let mut config = ResolverConfig::default();
    let err = config
        .apply_overrides(|key| {
            (key == "MEETSLOT_MAX_CONCURRENT_FETCHES").then(|| "many".to_string())
        })
        .unwrap_err();
    assert!(matches!(err, ResolveError::Config(_)));
}
