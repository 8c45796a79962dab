//! AI-derived payloads: analytics aggregates, similarity search, suggested
//! replies and batch processing summaries

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Aggregate counts across all reviews
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Analytics {
    pub sentiment_counts: BTreeMap<String, u64>,
    pub topic_counts: BTreeMap<String, u64>,
    pub location_counts: BTreeMap<String, u64>,
    /// Keyed by star rating rendered as a string ("1".."5")
    pub rating_distribution: BTreeMap<String, u64>,
    pub total_reviews: u64,
}

/// A single similarity match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: i64,
    pub similarity: f64,
    pub text: String,
}

/// Response of the similar-review search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub total: u64,
}

/// Generated reply for a review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedReply {
    pub reply: String,
    /// Classification tags, typically `sentiment` and `topic`
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub reasoning_log: String,
}

/// Summary of a batch sentiment/topic processing run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub message: String,
    #[serde(default)]
    pub processing_time: Option<String>,
    /// Reviews considered by the run. The service may encode this as a
    /// number or a numeric string.
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_reviews: Option<u64>,
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    match Option::<Count>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Count::Number(n)) => Ok(Some(n)),
        Some(Count::Text(text)) => text.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}
