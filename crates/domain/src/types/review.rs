//! Review records and the listing parameters used to page through them

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_RATING, MIN_RATING};

/// A review as stored by the remote service, including AI annotations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub location: String,
    pub rating: u8,
    pub text: String,
    /// Review date as `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A review submitted for ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub id: i64,
    pub location: String,
    pub rating: u8,
    pub text: String,
    pub date: String,
}

impl NewReview {
    /// Whether the rating falls inside the 1..=5 star range the service
    /// accepts.
    pub fn has_valid_rating(&self) -> bool {
        (MIN_RATING..=MAX_RATING).contains(&self.rating)
    }
}

/// One page of reviews returned by the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_prev: bool,
}

/// Result of a bulk ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    /// Human-readable summary from the service
    pub message: String,
    #[serde(default)]
    pub processing_time: Option<String>,
    /// Number of reviews sent in the request
    #[serde(default)]
    pub submitted: usize,
}

/// Optional filters for the review listing
///
/// Unset fields, and text fields that are blank, are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewFilters {
    pub location: Option<String>,
    pub sentiment: Option<String>,
    /// Free-text match against the review body
    pub search: Option<String>,
    pub rating_min: Option<u8>,
    pub rating_max: Option<u8>,
    /// Inclusive lower bound, `YYYY-MM-DD`
    pub date_from: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`
    pub date_to: Option<String>,
}

impl ReviewFilters {
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn sentiment(mut self, sentiment: impl Into<String>) -> Self {
        self.sentiment = Some(sentiment.into());
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn rating_range(mut self, min: u8, max: u8) -> Self {
        self.rating_min = Some(min);
        self.rating_max = Some(max);
        self
    }

    pub fn date_range(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.date_from = Some(from.into());
        self.date_to = Some(to.into());
        self
    }
}

/// Requested page; missing values fall back to page 1 of size 10
///
/// Values are forwarded as given. Out-of-range numbers (e.g. page 0) are
/// left for the service to reject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl Pagination {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page: Some(page), size: Some(size) }
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(DEFAULT_PAGE)
    }

    pub fn size(&self) -> u32 {
        self.size.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}
