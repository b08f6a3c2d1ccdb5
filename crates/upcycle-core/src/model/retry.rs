//! Bounded retry with exponential backoff around a [`VisionModel`] call.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::image::ImagePayload;
use super::trait_def::VisionModel;

/// Retry parameters for model calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total number of calls, including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
    /// Wait after the first failed attempt; doubles after each later one.
    pub base_delay: Duration,
    /// Upper bound on any single wait.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            base_delay: Self::DEFAULT_BASE_DELAY,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Wait before the attempt following the 0-based `attempt`:
    /// `base_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

/// Issues prompt + image requests and retries transient failures.
///
/// Each [`retrieve`](Self::retrieve) call owns its attempt counter, so one
/// retriever can serve any number of concurrent callers.
#[derive(Clone)]
pub struct ResponseRetriever {
    model: Arc<dyn VisionModel>,
    config: RetryConfig,
}

impl std::fmt::Debug for ResponseRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseRetriever")
            .field("model", &self.model.name())
            .field("config", &self.config)
            .finish()
    }
}

impl ResponseRetriever {
    pub fn new(model: Arc<dyn VisionModel>, config: RetryConfig) -> Self {
        Self { model, config }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Return the first non-empty response text, or `None` once every
    /// attempt has failed or come back empty.
    ///
    /// A permanent model error (see [`super::ModelError::is_transient`])
    /// ends the loop early.
    pub async fn retrieve(&self, prompt: &str, image: &ImagePayload) -> Option<String> {
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 0..max_attempts {
            match self.model.generate(prompt, image).await {
                Ok(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        debug!(
                            model = self.model.name(),
                            attempt = attempt + 1,
                            len = text.len(),
                            "received model response"
                        );
                        return Some(text.to_string());
                    }
                    warn!(
                        model = self.model.name(),
                        attempt = attempt + 1,
                        max_attempts,
                        "empty response from model"
                    );
                }
                Err(e) if !e.is_transient() => {
                    warn!(
                        model = self.model.name(),
                        attempt = attempt + 1,
                        error = %e,
                        "model call failed with a permanent error, not retrying"
                    );
                    return None;
                }
                Err(e) => {
                    warn!(
                        model = self.model.name(),
                        attempt = attempt + 1,
                        max_attempts,
                        error = %e,
                        "model call failed"
                    );
                }
            }

            if attempt + 1 < max_attempts {
                let delay = self.config.delay_for_attempt(attempt);
                debug!(delay_ms = delay.as_millis() as u64, "backing off before retry");
                tokio::time::sleep(delay).await;
            }
        }

        warn!(
            model = self.model.name(),
            max_attempts, "no usable response after exhausting retries"
        );
        None
    }
}
