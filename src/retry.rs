// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bounded retries for optimistic-concurrency updates.

use crate::constants::retry;
use crate::error::{ResourceManagerError, Result};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How often, and how patiently, a conflicting update is retried, and when
/// to come back if it never succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub factor: u32,
    pub max_backoff: Duration,
    /// Requeue delay once the attempts are used up
    pub degraded_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry::MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(retry::INITIAL_BACKOFF_MILLIS),
            factor: retry::BACKOFF_FACTOR,
            max_backoff: Duration::from_millis(retry::MAX_BACKOFF_MILLIS),
            degraded_delay: Duration::from_secs(retry::DEGRADED_REQUEUE_SECS),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retrying after the given (zero based) failed attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        let mut backoff = self.initial_backoff;
        for _ in 0..attempt {
            backoff = backoff.saturating_mul(self.factor);
            if backoff >= self.max_backoff {
                return self.max_backoff;
            }
        }
        backoff.min(self.max_backoff)
    }
}

/// Result of [`update_with_retry`]
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The update went through, or the object is gone
    Done,
    /// The update could not be applied; the last error is kept for logging
    Degraded(ResourceManagerError),
}

/// Run `update` until it succeeds, retrying conflicts with backoff.
///
/// Not-found ends the loop successfully. Conflicts past `max_attempts` and
/// any other failure degrade instead of failing. Only cancellation is
/// returned as an error.
pub async fn update_with_retry<F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut update: F,
) -> Result<UpdateOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match update().await {
            Ok(()) => return Ok(UpdateOutcome::Done),
            Err(e) if e.is_not_found() => return Ok(UpdateOutcome::Done),
            Err(ResourceManagerError::Cancelled) => return Err(ResourceManagerError::Cancelled),
            Err(e) if e.is_conflict() && attempt + 1 < max_attempts => {
                let backoff = policy.backoff(attempt);
                debug!(
                    "Update conflict on attempt {}/{}, retrying in {:?}",
                    attempt + 1,
                    max_attempts,
                    backoff
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ResourceManagerError::Cancelled),
                    _ = tokio::time::sleep(backoff) => {}
                }
                attempt += 1;
            }
            Err(e) => return Ok(UpdateOutcome::Degraded(e)),
        }
    }
}
