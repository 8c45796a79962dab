//! Application constants
//!
//! Centralized location for the defaults the review service client is
//! configured with.

// Remote service
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

// Retry policy
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

// Health monitor
pub const DEFAULT_HEALTH_POLL_INTERVAL_SECS: u64 = 30;

// Pagination
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

// Review validation
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

// Logging
pub const DEFAULT_LOG_LEVEL: &str = "info";
