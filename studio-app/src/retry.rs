//! Retry with exponential backoff for external service calls.
//!
//! Only errors reporting [`crate::AppError::is_retryable`] are repeated; local
//! failures and permanent service errors return immediately.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// How often and how patiently quota-limited calls are repeated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries allowed after the first call.
    pub max_retries: u32,
    /// Pause before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Longest pause, in milliseconds.
    pub max_delay_ms: u64,
    /// Growth of the pause from one retry to the next.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 1500,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Never retry.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            backoff_multiplier: 1.0,
        }
    }

    /// Pause before retry number `retry`, counting from 0. A multiplier
    /// below 1 is treated as 1 so pauses never shrink.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn backoff(&self, retry: u32) -> Duration {
        let growth = self.backoff_multiplier.max(1.0).powf(f64::from(retry));
        let millis = (self.initial_delay_ms as f64 * growth).min(self.max_delay_ms as f64);
        Duration::from_millis(millis.round() as u64)
    }
}

/// Run `op` until it succeeds, fails permanently or the retries run out.
///
/// # Errors
///
/// Returns the last error produced by `op`.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, what: &str, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::debug!(what, attempt, "Call succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if err.is_retryable() && attempt < config.max_retries => {
                let delay = config.backoff(attempt);
                tracing::warn!(
                    what,
                    attempt = attempt + 1,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "Quota exceeded, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
