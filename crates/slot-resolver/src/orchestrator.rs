//! The resolution orchestrator: Gathering, then Resolving.
//!
//! Gathering fans out one fetch per participant, bounded by
//! `max_concurrent_fetches` and cut off at the gather deadline. A participant
//! whose fetch fails or misses the deadline is treated as fully free and named
//! in the result's warnings. Gathered data is keyed by participant identity,
//! so completion order never reaches the engine.
//!
//! Resolving asks the suggestion provider first, when one is configured, and
//! falls back to the local pipeline if it fails, times out, or offers nothing
//! that survives validation.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use slot_engine::interval::covers;
use slot_engine::pipeline::is_well_formed;
use slot_engine::resolver;
use slot_engine::{
    resolve_local, BusySet, CandidateSlot, ExtendedHoursMode, Participant, ResolutionRequest,
    ResolutionResult, SearchWindow, Tier, TieredIntervals,
};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, instrument, warn};

use crate::config::ResolverConfig;
use crate::dto::{FreeView, ResolveRequest, ResolveResponse};
use crate::error::{ResolveError, Result};
use crate::provider::{HttpSuggestionProvider, SuggestedSlot, SuggestionProvider};
use crate::source::CalendarSource;

pub struct Resolver {
    source: Arc<dyn CalendarSource>,
    provider: Option<Arc<dyn SuggestionProvider>>,
    config: ResolverConfig,
}

impl Resolver {
    /// A resolver using only the local pipeline.
    pub fn new(source: impl CalendarSource + 'static, config: ResolverConfig) -> Self {
        Self {
            source: Arc::new(source),
            provider: None,
            config,
        }
    }

    /// A resolver wired from `config`, including the HTTP provider when
    /// `provider_url` is set.
    pub fn from_config(
        source: impl CalendarSource + 'static,
        config: ResolverConfig,
    ) -> Result<Self> {
        config.validate()?;
        let provider = match &config.provider_url {
            Some(url) => Some(
                HttpSuggestionProvider::new(url.clone(), config.provider_timeout())
                    .map_err(|e| ResolveError::Config(e.to_string()))?,
            ),
            None => None,
        };
        let resolver = Self::new(source, config);
        Ok(match provider {
            Some(provider) => resolver.with_provider(provider),
            None => resolver,
        })
    }

    pub fn with_provider(mut self, provider: impl SuggestionProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Resolve a request end to end.
    ///
    /// # Errors
    /// `ResolveError::InvalidRequest` before any fetch when the request can never
    /// be satisfied; `ResolveError::InternalInconsistency` on an engine bug.
    /// Calendar and provider failures never surface here.
    #[instrument(
        skip_all,
        fields(
            participants = request.participants.len(),
            duration = request.duration_minutes
        )
    )]
    pub async fn resolve(&self, request: &ResolutionRequest) -> Result<ResolutionResult> {
        request.validate(&self.config.working_hours)?;

        info!("Gathering calendars");
        let (busy, warnings) = self.gather(&request.participants, &request.window).await;

        info!(fetched = busy.len(), degraded = warnings.len(), "Resolving");
        if let Some(provider) = &self.provider {
            if let Some(suggestions) = self.consult(provider.as_ref(), &busy, request).await {
                info!(suggestions = suggestions.len(), "Resolved from provider suggestions");
                return Ok(ResolutionResult::success(suggestions).with_warnings(warnings));
            }
        }

        let result = resolve_local(
            request,
            &busy,
            &self.config.working_hours,
            &self.config.scoring,
        )?
        .with_warnings(warnings);
        info!(
            status = ?result.status,
            suggestions = result.suggestions.len(),
            "Resolved locally"
        );
        Ok(result)
    }

    /// Normalize a wire request, resolve it, and render the wire response.
    pub async fn resolve_wire(&self, request: ResolveRequest) -> Result<ResolveResponse> {
        let request = request.into_request(&self.config)?;
        let result = self.resolve(&request).await?;
        Ok(ResolveResponse::from(&result))
    }

    /// One participant's tiered free time inside `window`.
    pub async fn free_view(&self, participant: &str, window: &SearchWindow) -> Result<FreeView> {
        if participant.trim().is_empty() {
            return Err(ResolveError::InvalidRequest(
                "participant identifier must not be empty".to_string(),
            ));
        }
        if window.bounds().is_none() {
            return Err(ResolveError::InvalidRequest(
                "window end is not after window start".to_string(),
            ));
        }
        let policy = window.policy(&self.config.working_hours);
        policy.validate()?;

        let (busy, warnings) = self
            .gather(&[Participant::required(participant)], window)
            .await;
        let tiers = resolver::resolve(participant, &busy, window, policy);
        Ok(FreeView::new(participant, &window.timezone, tiers, warnings))
    }

    async fn gather(
        &self,
        participants: &[Participant],
        window: &SearchWindow,
    ) -> (BusySet, Vec<String>) {
        let deadline = Instant::now() + self.config.gather_deadline();
        let source = &self.source;

        let outcomes: Vec<_> = stream::iter(participants.iter().map(|p| async move {
            let outcome = timeout_at(deadline, source.fetch_busy(&p.id, window)).await;
            (p.id.clone(), outcome)
        }))
        .buffer_unordered(self.config.max_concurrent_fetches.max(1))
        .collect()
        .await;

        let mut busy = BusySet::new();
        let mut failed: BTreeMap<String, String> = BTreeMap::new();
        for (participant, outcome) in outcomes {
            match outcome {
                Ok(Ok(intervals)) => {
                    debug!(participant = %participant, busy = intervals.len(), "Fetched calendar");
                    busy.insert(participant, &intervals);
                }
                Ok(Err(err)) => {
                    warn!(
                        participant = %participant,
                        error = %err,
                        "Calendar fetch failed, treating participant as free"
                    );
                    failed.insert(participant, err.to_string());
                }
                Err(_) => {
                    warn!(
                        participant = %participant,
                        "Calendar fetch missed the gather deadline, treating participant as free"
                    );
                    failed.insert(participant, "gather deadline exceeded".to_string());
                }
            }
        }

        let warnings = failed
            .into_iter()
            .map(|(participant, reason)| {
                format!("could not fetch calendar for {participant} ({reason})")
            })
            .collect();
        (busy, warnings)
    }

    /// Ask the provider; `None` means fall back to the local pipeline.
    async fn consult(
        &self,
        provider: &dyn SuggestionProvider,
        busy: &BusySet,
        request: &ResolutionRequest,
    ) -> Option<Vec<CandidateSlot>> {
        let answer = timeout(self.config.provider_timeout(), provider.suggest(busy, request)).await;
        let suggested = match answer {
            Ok(Ok(suggested)) => suggested,
            Ok(Err(err)) => {
                warn!(
                    provider = provider.name(),
                    error = %err,
                    "Suggestion provider failed, falling back to local pipeline"
                );
                return None;
            }
            Err(_) => {
                warn!(
                    provider = provider.name(),
                    timeout_ms = self.config.provider_timeout_ms,
                    "Suggestion provider timed out, falling back to local pipeline"
                );
                return None;
            }
        };

        let offered = suggested.len();
        let accepted = self.adopt(suggested, busy, request);
        if accepted.is_empty() {
            warn!(
                provider = provider.name(),
                offered,
                "No usable provider suggestions, falling back to local pipeline"
            );
            return None;
        }
        if accepted.len() < offered {
            debug!(
                dropped = offered - accepted.len(),
                "Discarded provider suggestions that failed validation"
            );
        }
        Some(accepted)
    }

    /// Keep the provider's order; drop anything the gathered calendars contradict.
    fn adopt(
        &self,
        suggested: Vec<SuggestedSlot>,
        busy: &BusySet,
        request: &ResolutionRequest,
    ) -> Vec<CandidateSlot> {
        let policy = request.window.policy(&self.config.working_hours);
        let free = resolver::resolve_all(&request.participants, busy, &request.window, policy);

        let mut candidates: Vec<CandidateSlot> = suggested
            .into_iter()
            .filter_map(|slot| self.to_candidate(slot, &free, request))
            .collect();
        if self.config.scoring.extended_hours == ExtendedHoursMode::Fallback
            && candidates.iter().any(|c| c.tier == Tier::Standard)
        {
            candidates.retain(|c| c.tier == Tier::Standard);
        }

        let mut seen = HashSet::new();
        candidates.retain(|candidate| seen.insert(candidate.interval));
        candidates.truncate(request.max_suggestions);
        candidates
    }

    fn to_candidate(
        &self,
        slot: SuggestedSlot,
        free: &BTreeMap<String, TieredIntervals>,
        request: &ResolutionRequest,
    ) -> Option<CandidateSlot> {
        let interval = slot.interval;
        let is_free = |participant: &Participant, tier: Tier| {
            free.get(&participant.id)
                .is_some_and(|tiers| covers(&tiers.for_tier(tier), &interval))
        };
        let required_free = |tier: Tier| request.required().all(|p| is_free(p, tier));

        let tier = if required_free(Tier::Standard) {
            Tier::Standard
        } else if self.config.scoring.extended_hours != ExtendedHoursMode::Never
            && required_free(Tier::Extended)
        {
            Tier::Extended
        } else {
            return None;
        };

        let declared_missing =
            |p: &Participant| slot.missing_attendees.iter().any(|m| m.eq_ignore_ascii_case(&p.id));
        let (satisfied, missing): (Vec<Participant>, Vec<Participant>) = request
            .participants
            .iter()
            .cloned()
            .partition(|p| p.is_required() || (is_free(p, tier) && !declared_missing(p)));

        let pool = request.participants.len() - request.required().count();
        let attending = pool - missing.len();
        if pool > 0
            && attending * 100 < usize::from(request.minimum_attendee_percentage) * pool
        {
            return None;
        }

        let candidate = CandidateSlot {
            interval,
            tier,
            attendees_satisfied: satisfied,
            attendees_missing: missing,
            score: slot.score.clamp(0.0, 100.0),
            confidence: slot.confidence.clamp(0.0, 100.0),
        };
        is_well_formed(request, &candidate).then_some(candidate)
    }
}
