//! Retrying invoker with exponential backoff and jitter.
//!
//! Wraps a single external call. Only rate-limit failures are retried;
//! a rate limit that reports a zero quota and every other failure end
//! the call on first occurrence.

use crate::errors::ErrorClass;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt (total attempts = `max_retries + 1`).
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Maximum delay cap in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each retry.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    /// Upper bound of the random jitter as a fraction of the delay.
    #[serde(default = "default_jitter_ratio")]
    pub jitter_ratio: f64,
}

fn default_max_retries() -> usize {
    5
}

fn default_initial_delay_ms() -> u64 {
    2000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_jitter_ratio() -> f64 {
    0.1
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_factor: default_backoff_factor(),
            jitter_ratio: default_jitter_ratio(),
        }
    }
}

impl RetryConfig {
    /// Creates a new retry config with the default stage policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of retries.
    #[must_use]
    pub fn with_max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn with_initial_delay_ms(mut self, delay: u64) -> Self {
        self.initial_delay_ms = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay_ms(mut self, delay: u64) -> Self {
        self.max_delay_ms = delay;
        self
    }

    /// Sets the backoff factor. Values below 1.0 are clamped to 1.0.
    #[must_use]
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor.max(1.0);
        self
    }

    /// Sets the jitter ratio. Negative values disable jitter.
    #[must_use]
    pub fn with_jitter_ratio(mut self, ratio: f64) -> Self {
        self.jitter_ratio = ratio.max(0.0);
        self
    }

    /// Total number of attempts this policy allows.
    #[must_use]
    pub fn max_attempts(&self) -> usize {
        self.max_retries + 1
    }
}

/// State of one retrying invocation.
#[derive(Debug, Clone)]
pub struct RetryState {
    /// Attempts made so far.
    pub attempt: usize,
    /// Un-jittered delay for the next retry, in milliseconds.
    delay_ms: f64,
    /// Previous sleep, so consecutive sleeps never shrink.
    last_sleep: Duration,
    /// Classification of the most recent failure.
    pub last_class: Option<ErrorClass>,
}

impl RetryState {
    /// Creates a new retry state.
    #[must_use]
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            attempt: 0,
            delay_ms: config.initial_delay_ms as f64,
            last_sleep: Duration::ZERO,
            last_class: None,
        }
    }

    /// Returns true if no retries remain.
    #[must_use]
    pub fn is_exhausted(&self, config: &RetryConfig) -> bool {
        self.attempt >= config.max_attempts()
    }

    /// Computes the next sleep and advances the backoff.
    ///
    /// The sleep is `delay + uniform(0, jitter_ratio * delay)`, capped at
    /// `max_delay_ms` and never shorter than the previous sleep.
    pub fn next_delay(&mut self, config: &RetryConfig) -> Duration {
        let max = config.max_delay_ms as f64;
        let base = self.delay_ms.min(max);
        let spread = base * config.jitter_ratio;
        let jitter = if spread > 0.0 {
            rand::thread_rng().gen_range(0.0..=spread)
        } else {
            0.0
        };

        let sleep = Duration::from_secs_f64((base + jitter).min(max) / 1000.0).max(self.last_sleep);
        self.last_sleep = sleep;
        self.delay_ms = (base * config.backoff_factor).min(max);
        sleep
    }
}

/// Outcome of a retry decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry(Duration),
    /// No more retries, give up.
    GiveUp,
    /// Don't retry, the error is not retryable.
    NotRetryable,
}

/// Records a failed attempt and decides what to do next.
#[must_use]
pub fn should_retry(state: &mut RetryState, config: &RetryConfig, class: ErrorClass) -> RetryDecision {
    state.attempt += 1;
    state.last_class = Some(class);

    if !class.is_retryable() {
        return RetryDecision::NotRetryable;
    }
    if state.is_exhausted(config) {
        return RetryDecision::GiveUp;
    }
    RetryDecision::Retry(state.next_delay(config))
}

/// Executes an operation, retrying rate-limit failures with backoff.
///
/// Returns the first success, or the last error once retries are
/// exhausted or a non-retryable error occurs.
pub async fn invoke_with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    label: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut state = RetryState::new(config);

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let class = ErrorClass::classify(&e.to_string());
                match should_retry(&mut state, config, class) {
                    RetryDecision::Retry(delay) => {
                        warn!(
                            call = label,
                            attempt = state.attempt,
                            max_retries = config.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            "Rate limit hit, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::GiveUp => {
                        error!(
                            call = label,
                            retries = config.max_retries,
                            error = %e,
                            "Rate limit persisted through all retries"
                        );
                        return Err(e);
                    }
                    RetryDecision::NotRetryable => {
                        if class == ErrorClass::QuotaExhausted {
                            error!(call = label, error = %e, "Quota is zero, failing immediately");
                        } else {
                            debug!(call = label, error = %e, "Non-retryable error");
                        }
                        return Err(e);
                    }
                }
            }
        }
    }
}
