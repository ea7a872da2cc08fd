//! Error types for slot-resolver.
//!
//! Only [`ResolveError`] ever reaches the caller of [`crate::Resolver::resolve`].
//! Source and provider errors are recovered inside the orchestrator and
//! surface as warnings or log lines.

use std::time::Duration;

use slot_engine::EngineError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Rejected before any calendar was fetched; never retried.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// An engine invariant was broken. Indicates a bug.
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<EngineError> for ResolveError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidRequest(msg) => ResolveError::InvalidRequest(msg),
            EngineError::InvalidTimezone(tz) => {
                ResolveError::InvalidRequest(format!("invalid timezone: {tz}"))
            }
            EngineError::InvalidRule(msg) => {
                ResolveError::InvalidRequest(format!("invalid recurrence rule: {msg}"))
            }
            EngineError::InternalInconsistency(msg) => ResolveError::InternalInconsistency(msg),
        }
    }
}

/// Why one participant's busy intervals could not be fetched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("no calendar for participant '{0}'")]
    NotFound(String),

    #[error("calendar backend throttled the request")]
    Throttled { retry_after: Option<Duration> },

    #[error("calendar backend unavailable: {0}")]
    Unavailable(String),

    #[error("calendar fetch timed out")]
    Timeout,

    #[error("calendar store error: {0}")]
    Store(String),
}

impl SourceError {
    /// True for transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceError::Throttled { .. } | SourceError::Unavailable(_) | SourceError::Timeout
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("suggestion provider unavailable: {0}")]
    Unavailable(String),

    #[error("suggestion provider timed out")]
    Timeout,

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("suggestion provider returned no slots")]
    Empty,
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else {
            ProviderError::Unavailable(err.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("event rejected: {0}")]
    Rejected(String),

    #[error("event sink unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, ResolveError>;
