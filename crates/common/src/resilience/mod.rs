//! Resilience patterns for fault tolerance
//!
//! Generic, domain-agnostic retry support:
//! - **Backoff**: linear delay schedule
//! - **Policy**: a trait deciding per error and attempt whether to retry
//! - **Executor**: runs an async operation, sleeping between attempts and
//!   surfacing the last error once the policy or the retry budget says stop
//!
//! Error classification is left to callers; the HTTP-specific policy lives
//! in `reviewdesk-infra`.

pub mod retry;

// Re-export retry types
pub use retry::{
    LinearBackoff, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError, RetryExecutor,
    RetryPolicy, RetryResult,
};
