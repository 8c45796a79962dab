//! Error types used throughout the application

use thiserror::Error;

/// Bootstrap and configuration failures
///
/// Raised while loading configuration or building clients from it, before
/// any request reaches the review service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewDeskError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for ReviewDesk operations
pub type Result<T> = std::result::Result<T, ReviewDeskError>;
