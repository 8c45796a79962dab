//! # ReviewDesk Infrastructure
//!
//! Network-facing side of the ReviewDesk client.
//!
//! This crate contains:
//! - HTTP transport for the review service
//! - Error classification, retry policy and the API client
//! - Health monitoring with connectivity status
//! - Configuration loading and logging bootstrap
//!
//! ## Architecture
//! - Depends on `reviewdesk-domain` for types and `reviewdesk-common` for
//!   retry primitives
//! - Contains all "impure" code (network I/O, environment, files)

pub mod api;
pub mod config;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{ApiError, HealthMonitor, ReviewsApiClient};
pub use http::HttpClient;
