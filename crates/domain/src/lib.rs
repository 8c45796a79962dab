//! # ReviewDesk Domain
//!
//! Business domain types and models for the ReviewDesk review service client.
//!
//! This crate contains:
//! - Review data types (reviews, pages, analytics, search results)
//! - Filter and pagination parameters
//! - Connectivity status owned by the health monitor
//! - Domain error types and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other ReviewDesk crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
