//! Domain types and models
//!
//! Payloads exchanged with the review service plus the client-side
//! connectivity state.

pub mod health;
pub mod insights;
pub mod review;

pub use health::{ConnectivityStatus, HealthReport};
pub use insights::{Analytics, ProcessOutcome, SearchHit, SearchResults, SuggestedReply};
pub use review::{IngestOutcome, NewReview, Pagination, Review, ReviewFilters, ReviewPage};
