//! Generic retry strategy implementation
//!
//! This module provides the retry mechanism used by the API client for any
//! operation that might fail transiently. The caller supplies a
//! [`RetryPolicy`] that decides which errors are worth another attempt; the
//! executor owns the attempt counter, the backoff schedule and the retry
//! budget. Attempts are strictly sequential: the next one starts only after
//! the previous one has returned and the backoff delay has elapsed.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Errors surfaced once the executor stops retrying
///
/// Both variants carry the error returned by the final attempt.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The retry budget was spent on retryable failures
    #[error("All retry attempts exhausted after {attempts} tries: {source}")]
    Exhausted { attempts: u32, source: E },

    /// The policy declined to retry the failure
    #[error("Operation failed with non-retryable error: {source}")]
    NonRetryable { attempts: u32, source: E },
}

impl<E> RetryError<E> {
    /// Total attempts made, including the first one
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::NonRetryable { attempts, .. } => *attempts,
        }
    }

    /// Borrow the error returned by the final attempt
    pub fn last_error(&self) -> &E {
        match self {
            Self::Exhausted { source, .. } | Self::NonRetryable { source, .. } => source,
        }
    }

    /// Consume the wrapper and return the error of the final attempt
    pub fn into_last_error(self) -> E {
        match self {
            Self::Exhausted { source, .. } | Self::NonRetryable { source, .. } => source,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Result type for retry operations
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E> {
    /// Decide whether the failure of attempt `attempt` (0-based) should be
    /// retried
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation after the configured backoff delay
    Retry,
    /// Don't retry the operation
    Stop,
}

/// Linear backoff: `initial_delay + attempt * increment`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBackoff {
    pub initial_delay: Duration,
    pub increment: Duration,
}

impl LinearBackoff {
    pub fn new(initial_delay: Duration, increment: Duration) -> Self {
        Self { initial_delay, increment }
    }

    /// Schedule where retry `n` (0-based) waits `base * (n + 1)`
    pub fn from_base(base: Duration) -> Self {
        Self::new(base, base)
    }

    /// Calculate the delay before retrying the failure of `attempt` (0-based)
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        self.initial_delay.saturating_add(self.increment.saturating_mul(attempt))
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Delay schedule between attempts
    pub backoff: LinearBackoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: LinearBackoff::from_base(Duration::from_millis(1000)),
        }
    }
}

impl RetryConfig {
    /// Create a configuration builder
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Upper bound on attempts, first one included
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Builder for RetryConfig with fluent API
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn new() -> Self {
        Self { config: RetryConfig::default() }
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    pub fn linear_backoff(mut self, initial_delay: Duration, increment: Duration) -> Self {
        self.config.backoff = LinearBackoff::new(initial_delay, increment);
        self
    }

    pub fn build(self) -> RetryConfig {
        self.config
    }
}

/// The main retry executor
///
/// Holds no per-call state: every [`execute`](Self::execute) starts a fresh
/// attempt counter, so one executor can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    /// Create a new retry executor with the given configuration and policy
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    /// Create with default configuration
    pub fn with_policy(policy: P) -> Self {
        Self::new(RetryConfig::default(), policy)
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Execute an operation with retry logic
    ///
    /// `operation` receives the 0-based attempt number.
    #[instrument(skip(self, operation), fields(max_retries = self.config.max_retries))]
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> RetryResult<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Debug,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u32 = 0;

        loop {
            debug!("Executing operation (attempt {}/{})", attempt + 1, self.config.max_attempts());

            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("Operation succeeded after {} retries", attempt);
                    }
                    return Ok(value);
                }
                Err(error) => match self.policy.should_retry(&error, attempt) {
                    RetryDecision::Stop => {
                        debug!("Retry policy determined not to retry: {:?}", error);
                        return Err(RetryError::NonRetryable { attempts: attempt + 1, source: error });
                    }
                    RetryDecision::Retry if attempt >= self.config.max_retries => {
                        warn!(
                            "All retry attempts exhausted after {} tries, last error: {:?}",
                            attempt + 1,
                            error
                        );
                        return Err(RetryError::Exhausted { attempts: attempt + 1, source: error });
                    }
                    RetryDecision::Retry => {
                        let delay = self.config.backoff.calculate_delay(attempt);
                        warn!(
                            "Operation failed (attempt {}), retrying after {:?}: {:?}",
                            attempt + 1,
                            delay,
                            error
                        );
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        attempt += 1;
                    }
                },
            }
        }
    }
}
