//! Bounded retry with exponential backoff
//!
//! Sleeping goes through [`Sleeper`] so tests can observe backoff delays
//! without waiting for them. Every wait races the caller's
//! [`CancellationToken`]; nothing is retried once it fires.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use dx_core::RetryConfig;
use tokio_util::sync::CancellationToken;

use crate::error::{InferenceError, InferenceResult};

/// Asynchronous delay
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Attempt limit and backoff curve
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            multiplier: config.multiplier,
        }
    }

    /// Delay before retry number `retry` (1 for the first retry)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(32) as i32;
        let millis = self.base_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }

    /// Run `op` until it succeeds, fails permanently or attempts run out.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(
        &self,
        sleeper: &dyn Sleeper,
        cancel: &CancellationToken,
        mut op: F,
    ) -> InferenceResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = InferenceResult<T>>,
    {
        let mut attempt = 1;
        loop {
            if cancel.is_cancelled() {
                return Err(InferenceError::Cancelled);
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(InferenceError::Cancelled),
                result = op(attempt) => result,
            };

            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    log::warn!(
                        "Inference attempt {}/{} failed, retrying in {:?}: {}",
                        attempt,
                        self.max_attempts,
                        delay,
                        err
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(InferenceError::Cancelled),
                        _ = sleeper.sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;
