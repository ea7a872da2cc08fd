//! # slot-resolver
//!
//! Async orchestration around [`slot_engine`]: gather every participant's busy
//! intervals concurrently from a [`CalendarSource`], then resolve candidate
//! meeting slots either through an external [`SuggestionProvider`] or the local
//! pipeline, which is always the fallback.
//!
//! ```no_run
//! use slot_resolver::{LocalStoreSource, ResolveRequest, Resolver, ResolverConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let source = LocalStoreSource::from_file("calendars.json")?;
//! let resolver = Resolver::from_config(source, ResolverConfig::default())?;
//! let request: ResolveRequest = serde_json::from_str(r#"{
//!     "participants": [
//!         {"id": "alice@example.com"},
//!         {"id": "bob@example.com", "role": "optional"}
//!     ],
//!     "durationMinutes": "45m",
//!     "windowStart": "2026-03-16T09:00:00",
//!     "windowEnd": "2026-03-20T18:00:00",
//!     "timezone": "Europe/Berlin"
//! }"#)?;
//! let response = resolver.resolve_wire(request).await?;
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod sink;
pub mod source;

pub use config::{ResolverConfig, RetryConfig};
pub use dto::{parse_duration, parse_timestamp, FreeView, ResolveRequest, ResolveResponse};
pub use error::{ProviderError, ResolveError, SinkError, SourceError};
pub use orchestrator::Resolver;
pub use provider::{HttpSuggestionProvider, SuggestedSlot, SuggestionProvider};
pub use sink::{EventSink, MeetingDraft, MemorySink};
pub use source::{CalendarSource, InMemorySource, LocalStoreSource, RetryingSource};
