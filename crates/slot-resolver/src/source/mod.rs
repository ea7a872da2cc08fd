//! Calendar sources: where participants' busy intervals come from.
//!
//! The orchestrator depends only on [`CalendarSource`]. Concrete backends:
//!
//! - [`LocalStoreSource`]: a JSON document of fixed and recurring commitments
//! - [`InMemorySource`]: pre-loaded intervals with injectable failures and delays
//! - [`RetryingSource`]: wraps any source with exponential backoff

use std::sync::Arc;

use async_trait::async_trait;
use slot_engine::{SearchWindow, TimeInterval};

use crate::error::SourceError;

mod local_store;
mod memory;
mod retry;

pub use local_store::{Commitment, LocalStoreSource};
pub use memory::InMemorySource;
pub use retry::RetryingSource;

/// Fetches one participant's busy intervals for a search window.
///
/// Implementations own their connection pools and any caching. Returned
/// intervals need not be sorted or merged.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn fetch_busy(
        &self,
        participant: &str,
        window: &SearchWindow,
    ) -> Result<Vec<TimeInterval>, SourceError>;
}

#[async_trait]
impl<S: CalendarSource + ?Sized> CalendarSource for Arc<S> {
    async fn fetch_busy(
        &self,
        participant: &str,
        window: &SearchWindow,
    ) -> Result<Vec<TimeInterval>, SourceError> {
        (**self).fetch_busy(participant, window).await
    }
}
