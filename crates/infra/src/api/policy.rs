//! Retry policy for review service calls

use reviewdesk_common::resilience::{
    LinearBackoff, RetryConfig, RetryDecision, RetryExecutor, RetryPolicy,
};
use reviewdesk_domain::ApiConfig;

use super::errors::ClassifiedError;

/// Retries timeouts, rate limiting and server errors
///
/// Unauthorized, client errors, 503 and anything unclassifiable surface on
/// the first failure. The retry budget is enforced by the executor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransientFailurePolicy;

impl RetryPolicy<ClassifiedError> for TransientFailurePolicy {
    fn should_retry(&self, error: &ClassifiedError, _attempt: u32) -> RetryDecision {
        if error.is_transient() {
            RetryDecision::Retry
        } else {
            RetryDecision::Stop
        }
    }
}

/// Retry schedule described by the API config: `max_retries` retries, retry
/// `n` waiting `backoff_base * (n + 1)`
pub fn retry_config(config: &ApiConfig) -> RetryConfig {
    RetryConfig {
        max_retries: config.max_retries,
        backoff: LinearBackoff::from_base(config.backoff_base()),
    }
}

/// Executor applying [`TransientFailurePolicy`] on the configured schedule
pub fn retry_executor(config: &ApiConfig) -> RetryExecutor<TransientFailurePolicy> {
    RetryExecutor::new(retry_config(config), TransientFailurePolicy)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::StatusCode;

    use super::*;
    use crate::api::errors::ApiErrorCategory;

    fn failure(timed_out: bool, code: Option<u16>) -> ClassifiedError {
        let status = code.map(|c| StatusCode::from_u16(c).unwrap());
        ClassifiedError::classify(timed_out, status, None, None)
    }

    #[test]
    fn retry_eligibility_table() {
        let policy = TransientFailurePolicy;
        let cases = [
            (failure(true, None), ApiErrorCategory::Timeout, true),
            (failure(false, Some(500)), ApiErrorCategory::ServerError, true),
            (failure(false, Some(504)), ApiErrorCategory::ServerError, true),
            (failure(false, Some(429)), ApiErrorCategory::RateLimited, true),
            (failure(false, Some(401)), ApiErrorCategory::Unauthorized, false),
            (failure(false, Some(503)), ApiErrorCategory::ServiceUnavailable, false),
            (failure(false, Some(400)), ApiErrorCategory::ClientError, false),
            (failure(false, Some(404)), ApiErrorCategory::ClientError, false),
            (failure(false, None), ApiErrorCategory::Unknown, false),
        ];

        for (error, category, retryable) in cases {
            assert_eq!(error.category(), category);
            for attempt in 0..4 {
                let expected = if retryable { RetryDecision::Retry } else { RetryDecision::Stop };
                assert_eq!(policy.should_retry(&error, attempt), expected, "{category} @ {attempt}");
            }
        }
    }

    #[test]
    fn schedule_follows_config() {
        let config = ApiConfig::default();
        let retry = retry_config(&config);

        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.max_attempts(), 4);
        assert_eq!(retry.backoff.calculate_delay(0), Duration::from_millis(1000));
        assert_eq!(retry.backoff.calculate_delay(1), Duration::from_millis(2000));
        assert_eq!(retry.backoff.calculate_delay(2), Duration::from_millis(3000));

        let custom = ApiConfig { max_retries: 1, backoff_base_ms: 5, ..ApiConfig::default() };
        let executor = retry_executor(&custom);
        assert_eq!(executor.config().max_retries, 1);
        assert_eq!(executor.config().backoff.calculate_delay(1), Duration::from_millis(10));
    }

    #[tokio::test]
    async fn persistent_transient_failure_exhausts_budget() {
        let config = ApiConfig { backoff_base_ms: 1, ..ApiConfig::default() };
        let executor = retry_executor(&config);

        let result: Result<(), _> =
            executor.execute(|_| async { Err(failure(false, Some(500))) }).await;

        let err = result.unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(err.attempts(), 4);
    }

    #[tokio::test]
    async fn fatal_failure_after_retries_is_not_exhausted() {
        let config = ApiConfig { backoff_base_ms: 1, ..ApiConfig::default() };
        let executor = retry_executor(&config);

        let result: Result<(), _> = executor
            .execute(|attempt| async move {
                let code = if attempt < 3 { 500 } else { 401 };
                Err(failure(false, Some(code)))
            })
            .await;

        let err = result.unwrap_err();
        assert!(!err.is_exhausted());
        assert_eq!(err.attempts(), 4);
        assert_eq!(err.last_error().category(), ApiErrorCategory::Unauthorized);
    }
}
