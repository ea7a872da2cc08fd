use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use slot_engine::{SearchWindow, TimeInterval};

use super::CalendarSource;
use crate::error::SourceError;

/// Busy intervals held in memory.
///
/// Participants without an entry are reported as [`SourceError::NotFound`].
/// Failures and delays can be injected per participant.
#[derive(Debug, Default)]
pub struct InMemorySource {
    calendars: HashMap<String, Vec<TimeInterval>>,
    failures: HashMap<String, (SourceError, Option<u32>)>,
    delays: HashMap<String, Duration>,
    calls: Mutex<HashMap<String, u32>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_calendar(
        mut self,
        participant: impl Into<String>,
        busy: Vec<TimeInterval>,
    ) -> Self {
        self.calendars.insert(participant.into(), busy);
        self
    }

    /// Every fetch for `participant` fails with `error`.
    pub fn with_failure(mut self, participant: impl Into<String>, error: SourceError) -> Self {
        self.failures.insert(participant.into(), (error, None));
        self
    }

    /// The first `times` fetches for `participant` fail with `error`.
    pub fn with_transient_failure(
        mut self,
        participant: impl Into<String>,
        error: SourceError,
        times: u32,
    ) -> Self {
        self.failures.insert(participant.into(), (error, Some(times)));
        self
    }

    /// Every fetch for `participant` sleeps for `delay` before answering.
    pub fn with_delay(mut self, participant: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(participant.into(), delay);
        self
    }

    /// Number of fetches issued for `participant` so far.
    pub fn calls(&self, participant: &str) -> u32 {
        self.calls
            .lock()
            .map(|calls| calls.get(participant).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn record_call(&self, participant: &str) -> u32 {
        match self.calls.lock() {
            Ok(mut calls) => {
                let count = calls.entry(participant.to_string()).or_insert(0);
                *count += 1;
                *count
            }
            Err(_) => 1,
        }
    }
}

#[async_trait]
impl CalendarSource for InMemorySource {
    async fn fetch_busy(
        &self,
        participant: &str,
        _window: &SearchWindow,
    ) -> Result<Vec<TimeInterval>, SourceError> {
        let attempt = self.record_call(participant);

        if let Some(delay) = self.delays.get(participant) {
            tokio::time::sleep(*delay).await;
        }

        if let Some((error, times)) = self.failures.get(participant) {
            let still_failing = times.map_or(true, |times| attempt <= times);
            if still_failing {
                return Err(error.clone());
            }
        }

        self.calendars
            .get(participant)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(participant.to_string()))
    }
}
