//! Retrying chat backend.
//!
//! Wraps any [`LlmPort`] so a flaky local model gets a few more chances
//! before the player sees an "unavailable" line in the chat log.

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::ports::{LlmError, LlmPort, LlmRequest, LlmResponse};

/// Backoff schedule for chat requests
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt (`LLM_MAX_RETRIES`)
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each one after
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Fraction of the delay randomly added or removed (0.0-1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30000,
            jitter_factor: 0.2,
        }
    }
}

impl RetryConfig {
    /// Capped exponential delay before retry number `retry` (1-based), no jitter.
    pub fn backoff_ms(&self, retry: u32) -> u64 {
        let factor = 2u64.saturating_pow(retry.saturating_sub(1));
        self.base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }

    fn delay(&self, retry: u32) -> Duration {
        let backoff = self.backoff_ms(retry);
        let spread = (backoff as f64 * self.jitter_factor.clamp(0.0, 1.0)) as u64;
        if spread == 0 {
            return Duration::from_millis(backoff);
        }
        let low = backoff.saturating_sub(spread);
        let high = backoff.saturating_add(spread);
        Duration::from_millis(rand::thread_rng().gen_range(low..=high))
    }
}

pub struct ResilientLlmClient {
    inner: Arc<dyn LlmPort>,
    config: RetryConfig,
}

impl ResilientLlmClient {
    pub fn new(inner: Arc<dyn LlmPort>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl LlmPort for ResilientLlmClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let mut retry = 0;
        loop {
            let error = match self.inner.generate(request.clone()).await {
                Ok(response) => {
                    if retry > 0 {
                        tracing::info!(retries = retry, "Chat request succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(e) => e,
            };

            if !error.is_transient() {
                tracing::error!(error = %error, "Chat request failed, not retrying");
                return Err(error);
            }
            if retry >= self.config.max_retries {
                tracing::error!(
                    attempts = retry + 1,
                    error = %error,
                    "Chat request failed after all retries"
                );
                return Err(error);
            }

            retry += 1;
            let delay = self.config.delay(retry);
            tracing::warn!(
                retry,
                max_retries = self.config.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Chat request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
