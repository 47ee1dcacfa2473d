//! Retry controller
//!
//! Wraps a [`SourceResolver`] with bounded attempts, capped exponential
//! backoff and device-profile fallback. Every failed attempt nudges the
//! remote config worker so a rotated profile can be in place for the next
//! one.

use crate::error::{ResolverError, Result};
use crate::profile::DeviceProfileKind;
use crate::remote_config::RefreshRequest;
use crate::resolver::SourceResolver;
use crate::types::ResolvedSource;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Attempt and backoff settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per resolution; 0 behaves like 1
    pub max_attempts: u32,
    /// Delay after the first failure
    pub initial_backoff: Duration,
    /// Upper bound for any delay
    pub max_backoff: Duration,
    /// Alternate to the other device profile on later attempts
    pub profile_fallback: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
            profile_fallback: true,
        }
    }
}

impl RetryPolicy {
    /// Retries with no delay in between
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Delay after failed attempt `attempt` (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        if self.initial_backoff.is_zero() {
            return Duration::ZERO;
        }
        let shift = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1 << shift)
            .min(self.max_backoff)
    }

    /// Profile used on attempt `attempt` (1-based)
    ///
    /// The first attempt and every odd one use `preferred`; even attempts
    /// use the fallback when enabled.
    pub fn profile_for_attempt(
        &self,
        attempt: u32,
        preferred: DeviceProfileKind,
    ) -> DeviceProfileKind {
        if self.profile_fallback && attempt % 2 == 0 {
            preferred.fallback()
        } else {
            preferred
        }
    }
}

/// Resolver with retries
pub struct RetryController<R> {
    resolver: R,
    policy: RetryPolicy,
    refresh: Option<mpsc::Sender<RefreshRequest>>,
}

impl<R: SourceResolver> RetryController<R> {
    pub fn new(resolver: R, policy: RetryPolicy) -> Self {
        Self {
            resolver,
            policy,
            refresh: None,
        }
    }

    /// Send a refresh request on `tx` after each failed attempt
    #[must_use]
    pub fn with_refresh(mut self, tx: mpsc::Sender<RefreshRequest>) -> Self {
        self.refresh = Some(tx);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &R {
        &self.resolver
    }

    /// Resolve `content_id`, trying up to `max_attempts` times.
    ///
    /// Returns the first success. When every attempt fails the error is
    /// [`ResolverError::Exhausted`] wrapping the last failure.
    pub async fn resolve_with_retries(
        &self,
        content_id: &str,
        max_attempts: u32,
        preferred: DeviceProfileKind,
    ) -> Result<ResolvedSource> {
        let attempts = max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            let kind = self.policy.profile_for_attempt(attempt, preferred);
            debug!(content_id, attempt, profile = %kind, "Resolving");

            match self.resolver.resolve(content_id, kind).await {
                Ok(source) => {
                    if attempt > 1 {
                        info!(content_id, attempt, profile = %kind, "Resolved after retry");
                    }
                    return Ok(source);
                }
                Err(e) => {
                    warn!(
                        content_id,
                        attempt,
                        max_attempts = attempts,
                        profile = %kind,
                        "Resolve attempt failed: {}",
                        e
                    );
                    self.request_refresh(content_id, attempt);
                    last_error = Some(e);
                }
            }

            if attempt < attempts {
                let delay = self.policy.backoff_for(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        let last = last_error.unwrap_or_else(|| ResolverError::NoAudioFormat {
            content_id: content_id.to_string(),
        });
        Err(ResolverError::Exhausted {
            attempts,
            last: Box::new(last),
        })
    }

    fn request_refresh(&self, content_id: &str, attempt: u32) {
        let Some(tx) = &self.refresh else {
            return;
        };
        let request = RefreshRequest {
            content_id: content_id.to_string(),
            attempt,
        };
        if let Err(e) = tx.try_send(request) {
            debug!("Refresh request dropped: {}", e);
        }
    }
}

#[async_trait]
impl<R: SourceResolver> SourceResolver for RetryController<R> {
    async fn resolve(&self, content_id: &str, kind: DeviceProfileKind) -> Result<ResolvedSource> {
        self.resolve_with_retries(content_id, self.policy.max_attempts, kind)
            .await
    }
}
