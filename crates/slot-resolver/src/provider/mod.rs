//! External suggestion providers.
//!
//! A provider may rank slots with information the local pipeline lacks. Its
//! answer is advisory: the orchestrator re-checks every suggestion against the
//! gathered calendars and falls back to the local pipeline when nothing usable
//! comes back.

use async_trait::async_trait;
use slot_engine::{BusySet, ResolutionRequest, TimeInterval};

use crate::error::ProviderError;

mod http;

pub use http::{parse_response, HttpSuggestionProvider};

/// Score and confidence assumed when a provider omits them.
pub const DEFAULT_PROVIDER_SCORE: f64 = 90.0;

/// A slot proposed by a provider, before the orchestrator validates it.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestedSlot {
    pub interval: TimeInterval,
    pub attendees_included: Vec<String>,
    pub missing_attendees: Vec<String>,
    pub score: f64,
    pub confidence: f64,
}

#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str {
        "external"
    }

    async fn suggest(
        &self,
        busy: &BusySet,
        request: &ResolutionRequest,
    ) -> Result<Vec<SuggestedSlot>, ProviderError>;
}
