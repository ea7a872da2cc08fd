use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use slot_engine::{BusySet, ResolutionRequest, Role, TimeInterval};
use tracing::{debug, instrument, warn};

use super::{SuggestedSlot, SuggestionProvider, DEFAULT_PROVIDER_SCORE};
use crate::dto::parse_timestamp;
use crate::error::ProviderError;

const NO_SLOTS_STATUS: &str = "no_slots_available";

/// Posts gathered calendars to an HTTP endpoint and reads back suggestions.
#[derive(Debug, Clone)]
pub struct HttpSuggestionProvider {
    http: reqwest::Client,
    url: String,
}

impl HttpSuggestionProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuggestPayload<'a> {
    participant_calendars: BTreeMap<&'a str, &'a [TimeInterval]>,
    attendees: Vec<&'a str>,
    priority_attendees: Vec<&'a str>,
    duration: i64,
    start_time: String,
    end_time: String,
    time_zone: &'static str,
    max_suggestions: usize,
}

impl<'a> SuggestPayload<'a> {
    fn new(busy: &'a BusySet, request: &'a ResolutionRequest) -> Self {
        let ids = |role: Option<Role>| -> Vec<&'a str> {
            request
                .participants
                .iter()
                .filter(|p| role.map_or(true, |role| p.role == role))
                .map(|p| p.id.as_str())
                .collect()
        };

        Self {
            participant_calendars: request
                .participants
                .iter()
                .map(|p| (p.id.as_str(), busy.get(&p.id)))
                .collect(),
            attendees: ids(None),
            priority_attendees: ids(Some(Role::Priority)),
            duration: request.duration_minutes,
            start_time: request.window.start.to_rfc3339(),
            end_time: request.window.end.to_rfc3339(),
            time_zone: request.window.timezone.name(),
            max_suggestions: request.max_suggestions,
        }
    }
}

#[async_trait]
impl SuggestionProvider for HttpSuggestionProvider {
    fn name(&self) -> &str {
        &self.url
    }

    #[instrument(skip_all, fields(url = %self.url))]
    async fn suggest(
        &self,
        busy: &BusySet,
        request: &ResolutionRequest,
    ) -> Result<Vec<SuggestedSlot>, ProviderError> {
        debug!("Sending calendars to suggestion provider");

        let response = self
            .http
            .post(&self.url)
            .json(&SuggestPayload::new(busy, request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let snippet: String = body.chars().take(200).collect();
            return Err(ProviderError::Unavailable(format!("HTTP {status}: {snippet}")));
        }

        parse_response(&body, &request.window.timezone)
    }
}

#[derive(Debug, Deserialize)]
struct DirectResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    suggested_slots: Vec<RawSlot>,
    #[serde(default)]
    reasoning_summary: String,
}

#[derive(Debug, Deserialize)]
struct RawSlot {
    start_time: String,
    end_time: String,
    #[serde(default)]
    attendees_included: Vec<String>,
    #[serde(default)]
    missing_attendees: Vec<String>,
    confidence: Option<f64>,
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WrappedResponse {
    #[serde(default)]
    output: Vec<WrappedOutput>,
}

#[derive(Debug, Deserialize)]
struct WrappedOutput {
    #[serde(default)]
    content: Vec<WrappedContent>,
}

#[derive(Debug, Deserialize)]
struct WrappedContent {
    #[serde(default)]
    text: String,
}

/// Parse a provider response body.
///
/// Accepts the direct `{status, suggested_slots, reasoning_summary}` shape or
/// the same document embedded as text in `{output: [{content: [{text}]}]}`.
/// Naive slot timestamps are read in `tz`. Slots with unparseable or inverted
/// times are skipped.
///
/// # Errors
/// `ProviderError::Empty` when the provider reports no slots,
/// `ProviderError::Malformed` when neither shape matches or no slot survives.
pub fn parse_response(body: &str, tz: &Tz) -> Result<Vec<SuggestedSlot>, ProviderError> {
    let direct = match serde_json::from_str::<DirectResponse>(body) {
        Ok(direct) if !direct.status.is_empty() => direct,
        _ => unwrap_embedded(body)?,
    };

    if direct.status == NO_SLOTS_STATUS || direct.suggested_slots.is_empty() {
        debug!(reasoning = %direct.reasoning_summary, "Provider reported no slots");
        return Err(ProviderError::Empty);
    }

    let slots: Vec<SuggestedSlot> = direct
        .suggested_slots
        .into_iter()
        .filter_map(|raw| {
            let interval = parse_timestamp(&raw.start_time, tz)
                .ok()
                .zip(parse_timestamp(&raw.end_time, tz).ok())
                .and_then(|(start, end)| TimeInterval::non_empty(start, end));
            if interval.is_none() {
                warn!(
                    start = %raw.start_time,
                    end = %raw.end_time,
                    "Skipping provider slot with unusable times"
                );
            }
            Some(SuggestedSlot {
                interval: interval?,
                attendees_included: raw.attendees_included,
                missing_attendees: raw.missing_attendees,
                score: raw.score.unwrap_or(DEFAULT_PROVIDER_SCORE),
                confidence: raw.confidence.unwrap_or(DEFAULT_PROVIDER_SCORE),
            })
        })
        .collect();

    if slots.is_empty() {
        return Err(ProviderError::Malformed(
            "no suggested slot had usable times".to_string(),
        ));
    }
    Ok(slots)
}

fn unwrap_embedded(body: &str) -> Result<DirectResponse, ProviderError> {
    let wrapped: WrappedResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;
    let text = wrapped
        .output
        .first()
        .and_then(|output| output.content.first())
        .map(|content| content.text.trim())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| {
            ProviderError::Malformed("response has no recognizable content".to_string())
        })?;

    let text = text
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    match serde_json::from_str::<DirectResponse>(text) {
        Ok(direct) if !direct.status.is_empty() => Ok(direct),
        Ok(_) => Err(ProviderError::Malformed("embedded response has no status".to_string())),
        Err(e) => Err(ProviderError::Malformed(e.to_string())),
    }
}
