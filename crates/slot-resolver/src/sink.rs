//! Materializing a chosen slot as a calendar event.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use slot_engine::{CandidateSlot, TimeInterval};

use crate::error::SinkError;

/// Everything an event backend needs to book a meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDraft {
    pub subject: String,
    #[serde(default)]
    pub description: String,
    pub organizer: String,
    /// Every invitee, including those the slot could not satisfy.
    pub attendees: Vec<String>,
    pub slot: TimeInterval,
    /// Attach an online-meeting link.
    #[serde(default)]
    pub online: bool,
}

impl MeetingDraft {
    /// Draft a meeting for `slot`, inviting everyone it was resolved for.
    pub fn from_candidate(
        subject: impl Into<String>,
        organizer: impl Into<String>,
        slot: &CandidateSlot,
    ) -> Self {
        let attendees = slot
            .attendees_satisfied
            .iter()
            .chain(&slot.attendees_missing)
            .map(|p| p.id.clone())
            .collect();
        Self {
            subject: subject.into(),
            description: String::new(),
            organizer: organizer.into(),
            attendees,
            slot: slot.interval,
            online: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    /// Create the event and return the backend's identifier for it.
    async fn create_event(&self, draft: &MeetingDraft) -> Result<String, SinkError>;
}

/// Keeps created drafts in memory. Useful for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<MeetingDraft>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MeetingDraft> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn create_event(&self, draft: &MeetingDraft) -> Result<String, SinkError> {
        if draft.subject.trim().is_empty() {
            return Err(SinkError::Rejected("subject must not be empty".to_string()));
        }
        if draft.attendees.is_empty() {
            return Err(SinkError::Rejected("meeting has no attendees".to_string()));
        }

        let mut events = self
            .events
            .lock()
            .map_err(|_| SinkError::Unavailable("event store poisoned".to_string()))?;
        events.push(draft.clone());
        Ok(format!("evt-{}", events.len()))
    }
}
