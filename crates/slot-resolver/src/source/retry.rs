use async_trait::async_trait;
use slot_engine::{SearchWindow, TimeInterval};

use super::CalendarSource;
use crate::config::RetryConfig;
use crate::error::SourceError;

/// Retries transient failures of the wrapped source with exponential backoff.
///
/// A throttled response that names a `retry_after` waits that long instead of
/// the computed delay. Non-retryable errors are returned immediately.
#[derive(Debug)]
pub struct RetryingSource<S> {
    inner: S,
    policy: RetryConfig,
}

impl<S: CalendarSource> RetryingSource<S> {
    pub fn new(inner: S, policy: RetryConfig) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: CalendarSource> CalendarSource for RetryingSource<S> {
    async fn fetch_busy(
        &self,
        participant: &str,
        window: &SearchWindow,
    ) -> Result<Vec<TimeInterval>, SourceError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match self.inner.fetch_busy(participant, window).await {
                Ok(busy) => return Ok(busy),
                Err(err) if err.is_retryable() && attempt + 1 < attempts => {
                    let delay = match &err {
                        SourceError::Throttled {
                            retry_after: Some(wait),
                        } => *wait,
                        _ => self.policy.delay_for(attempt),
                    };

                    tracing::warn!(
                        participant,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Calendar fetch failed, retrying: {}",
                        err
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
