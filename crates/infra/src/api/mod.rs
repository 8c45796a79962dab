//! Review service API client
//!
//! Layers, leaves first:
//!
//! - [`errors`]: classifies failed calls and builds user-facing errors
//! - [`policy`]: decides which classified failures are retried
//! - [`client`]: one method per business action, each validated and retried
//! - [`health`]: background poller publishing connectivity status

pub mod client;
pub mod errors;
pub mod health;
pub mod policy;

pub use client::{ReviewsApiClient, ReviewsApiClientBuilder};
pub use errors::{ApiError, ApiErrorCategory, ClassifiedError, Feature, Operation};
pub use health::{HealthMonitor, HealthMonitorError, HealthProbe};
pub use policy::{retry_config, retry_executor, TransientFailurePolicy};
