//! API-specific error types
//!
//! Failed calls are first reduced to a [`ClassifiedError`] (category, status,
//! detail), which drives retry decisions. Once retrying stops, the facade
//! turns the classification into an [`ApiError`] whose message is meant for
//! the end user.

use std::fmt;

use reqwest::StatusCode;
use reviewdesk_common::resilience::RetryError;
use reviewdesk_domain::ReviewDeskError;
use serde_json::Value;
use thiserror::Error;

use crate::http::{ResponseEnvelope, TransportError};

const UNKNOWN_DETAIL: &str = "Unknown error";

/// Normalized category of a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorCategory {
    /// No response before the request timeout
    Timeout,
    /// 401
    Unauthorized,
    /// 429
    RateLimited,
    /// 503, a known degraded backend state
    ServiceUnavailable,
    /// Any other 5xx
    ServerError,
    /// 4xx other than 401 and 429
    ClientError,
    /// Connection failures, unexpected statuses, undecodable payloads
    Unknown,
}

impl ApiErrorCategory {
    /// Whether another attempt may succeed without any change on the
    /// caller's side
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Timeout | Self::ServerError | Self::RateLimited)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate_limited",
            Self::ServiceUnavailable => "service_unavailable",
            Self::ServerError => "server_error",
            Self::ClientError => "client_error",
            Self::Unknown => "unknown",
        }
    }

    fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            401 => Self::Unauthorized,
            429 => Self::RateLimited,
            503 => Self::ServiceUnavailable,
            500..=599 => Self::ServerError,
            400..=499 => Self::ClientError,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ApiErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call reduced to what retrying and reporting need
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{detail}")]
pub struct ClassifiedError {
    category: ApiErrorCategory,
    status: Option<StatusCode>,
    detail: String,
}

impl ClassifiedError {
    /// Classify a failed call.
    ///
    /// A timeout wins over any status. Otherwise the status decides, and a
    /// call without a status is `Unknown`. The detail is the body's `detail`
    /// field when present, else `message`, else `"Unknown error"`.
    pub fn classify(
        timed_out: bool,
        status: Option<StatusCode>,
        body: Option<&Value>,
        message: Option<&str>,
    ) -> Self {
        let category = if timed_out {
            ApiErrorCategory::Timeout
        } else {
            status.map_or(ApiErrorCategory::Unknown, ApiErrorCategory::from_status)
        };

        let detail = body
            .and_then(body_detail)
            .or_else(|| message.map(str::trim).filter(|m| !m.is_empty()).map(str::to_string))
            .unwrap_or_else(|| UNKNOWN_DETAIL.to_string());

        Self { category, status, detail }
    }

    /// Classify a call that never received a response
    pub fn from_transport(error: &TransportError) -> Self {
        Self::classify(error.is_timeout(), None, None, Some(error.message()))
    }

    /// Classify a response with a non-success status
    pub fn from_response(response: &ResponseEnvelope) -> Self {
        let status = response.status();
        let message = format!("Request failed with status code {}", status.as_u16());
        Self::classify(false, Some(status), Some(response.body()), Some(&message))
    }

    /// A successful response whose body does not have the expected shape
    pub fn decode_failure(response: &ResponseEnvelope, error: &serde_json::Error) -> Self {
        Self {
            category: ApiErrorCategory::Unknown,
            status: Some(response.status()),
            detail: format!("Unexpected response payload: {error}"),
        }
    }

    pub fn category(&self) -> ApiErrorCategory {
        self.category
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn is_transient(&self) -> bool {
        self.category.is_transient()
    }
}

fn body_detail(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::Null => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Optional backend capability that can be switched off server-side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    AiReplies,
    Search,
    Analytics,
    BatchProcessing,
}

impl Feature {
    pub fn label(self) -> &'static str {
        match self {
            Self::AiReplies => "AI",
            Self::Search => "Search",
            Self::Analytics => "Analytics",
            Self::BatchProcessing => "Batch processing",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors returned by facade operations
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input rejected before any network call
    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    NotFound { message: String, attempts: u32, source: ClassifiedError },

    /// The service answered 503 for an optional capability
    #[error("{message}")]
    Unavailable { feature: Feature, message: String, attempts: u32, source: ClassifiedError },

    #[error("{message}")]
    Failed { message: String, attempts: u32, source: ClassifiedError },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Classification of the underlying failure, if a call was made
    pub fn classification(&self) -> Option<&ClassifiedError> {
        match self {
            Self::NotFound { source, .. }
            | Self::Unavailable { source, .. }
            | Self::Failed { source, .. } => Some(source),
            Self::Validation { .. } | Self::Config(_) => None,
        }
    }

    pub fn category(&self) -> Option<ApiErrorCategory> {
        self.classification().map(ClassifiedError::category)
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.classification().and_then(ClassifiedError::status)
    }

    /// Number of calls made before giving up (`0` when none was made)
    pub fn attempts(&self) -> u32 {
        match self {
            Self::NotFound { attempts, .. }
            | Self::Unavailable { attempts, .. }
            | Self::Failed { attempts, .. } => *attempts,
            Self::Validation { .. } | Self::Config(_) => 0,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

impl From<ReviewDeskError> for ApiError {
    fn from(err: ReviewDeskError) -> Self {
        match err {
            ReviewDeskError::Config(message) => Self::Config(message),
        }
    }
}

/// Facade operation a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListReviews,
    GetReview,
    IngestReviews,
    SuggestReply,
    Analytics,
    Search,
    ProcessReviews,
    HealthCheck,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Self::ListReviews => "list_reviews",
            Self::GetReview => "get_review",
            Self::IngestReviews => "ingest_reviews",
            Self::SuggestReply => "suggest_reply",
            Self::Analytics => "get_analytics",
            Self::Search => "search_similar",
            Self::ProcessReviews => "process_reviews",
            Self::HealthCheck => "health_check",
        }
    }

    /// Prefix of every failure message produced by this operation
    pub fn failure_prefix(self) -> &'static str {
        match self {
            Self::ListReviews => "Failed to fetch reviews",
            Self::GetReview => "Failed to fetch review",
            Self::IngestReviews => "Failed to ingest reviews",
            Self::SuggestReply => "Failed to generate reply",
            Self::Analytics => "Failed to fetch analytics",
            Self::Search => "Search failed",
            Self::ProcessReviews => "Failed to process reviews",
            Self::HealthCheck => "Health check failed",
        }
    }

    fn feature(self) -> Option<Feature> {
        match self {
            Self::SuggestReply => Some(Feature::AiReplies),
            Self::Search => Some(Feature::Search),
            Self::Analytics => Some(Feature::Analytics),
            Self::ProcessReviews => Some(Feature::BatchProcessing),
            _ => None,
        }
    }

    fn addresses_single_review(self) -> bool {
        matches!(self, Self::GetReview | Self::SuggestReply)
    }

    /// Validation failure carrying this operation's prefix
    pub fn invalid(self, reason: impl fmt::Display) -> ApiError {
        ApiError::Validation { message: format!("{}: {reason}", self.failure_prefix()) }
    }

    /// Turn the outcome of a retried call into the user-facing error
    pub fn translate(self, error: RetryError<ClassifiedError>) -> ApiError {
        let attempts = error.attempts();
        let source = error.into_last_error();
        let prefix = self.failure_prefix();

        if self.addresses_single_review() && source.status() == Some(StatusCode::NOT_FOUND) {
            return ApiError::NotFound {
                message: format!("{prefix}: review not found"),
                attempts,
                source,
            };
        }

        if source.category() == ApiErrorCategory::ServiceUnavailable {
            if let Some(feature) = self.feature() {
                let message = format!("{prefix}: {feature} unavailable ({})", source.detail());
                return ApiError::Unavailable { feature, message, attempts, source };
            }
        }

        ApiError::Failed { message: format!("{prefix}: {}", source.detail()), attempts, source }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::http::TransportErrorKind;

    fn status(code: u16) -> Option<StatusCode> {
        Some(StatusCode::from_u16(code).unwrap())
    }

    fn category_for(code: u16) -> ApiErrorCategory {
        ClassifiedError::classify(false, status(code), None, None).category()
    }

    #[test]
    fn test_status_categories() {
        assert_eq!(category_for(401), ApiErrorCategory::Unauthorized);
        assert_eq!(category_for(429), ApiErrorCategory::RateLimited);
        assert_eq!(category_for(503), ApiErrorCategory::ServiceUnavailable);
        assert_eq!(category_for(500), ApiErrorCategory::ServerError);
        assert_eq!(category_for(502), ApiErrorCategory::ServerError);
        assert_eq!(category_for(599), ApiErrorCategory::ServerError);
        assert_eq!(category_for(400), ApiErrorCategory::ClientError);
        assert_eq!(category_for(403), ApiErrorCategory::ClientError);
        assert_eq!(category_for(404), ApiErrorCategory::ClientError);
        assert_eq!(category_for(302), ApiErrorCategory::Unknown);
    }

    #[test]
    fn test_timeout_takes_priority() {
        let classified = ClassifiedError::classify(true, status(500), None, Some("slow"));
        assert_eq!(classified.category(), ApiErrorCategory::Timeout);

        let error = TransportError::new(
            TransportErrorKind::Timeout,
            "request timed out after 30000ms, please try again",
            Duration::from_secs(30),
        );
        let classified = ClassifiedError::from_transport(&error);
        assert_eq!(classified.category(), ApiErrorCategory::Timeout);
        assert_eq!(classified.status(), None);
        assert!(classified.detail().contains("timed out"));
    }

    #[test]
    fn test_connection_failure_is_unknown() {
        let error = TransportError::new(
            TransportErrorKind::Connect,
            "HTTP request failed: connection refused",
            Duration::from_millis(3),
        );
        let classified = ClassifiedError::from_transport(&error);

        assert_eq!(classified.category(), ApiErrorCategory::Unknown);
        assert!(!classified.is_transient());
    }

    #[test]
    fn test_detail_extraction() {
        let body = json!({"detail": "Review not found"});
        let with_detail =
            ClassifiedError::classify(false, status(404), Some(&body), Some("fallback"));
        assert_eq!(with_detail.detail(), "Review not found");

        let structured = json!({"detail": [{"loc": ["body"], "msg": "field required"}]});
        let rendered = ClassifiedError::classify(false, status(422), Some(&structured), None);
        assert!(rendered.detail().contains("field required"));

        let plain = Value::String("Bad Gateway".into());
        let fallback = ClassifiedError::classify(false, status(502), Some(&plain), Some("boom"));
        assert_eq!(fallback.detail(), "boom");

        let nothing = ClassifiedError::classify(false, None, None, None);
        assert_eq!(nothing.detail(), "Unknown error");
    }

    #[test]
    fn test_transient_categories() {
        assert!(ApiErrorCategory::Timeout.is_transient());
        assert!(ApiErrorCategory::ServerError.is_transient());
        assert!(ApiErrorCategory::RateLimited.is_transient());
        assert!(!ApiErrorCategory::Unauthorized.is_transient());
        assert!(!ApiErrorCategory::ServiceUnavailable.is_transient());
        assert!(!ApiErrorCategory::ClientError.is_transient());
        assert!(!ApiErrorCategory::Unknown.is_transient());
    }

    fn stopped(code: u16, detail: &str) -> RetryError<ClassifiedError> {
        let body = json!({ "detail": detail });
        RetryError::NonRetryable {
            attempts: 1,
            source: ClassifiedError::classify(false, status(code), Some(&body), None),
        }
    }

    #[test]
    fn test_not_found_only_for_single_review_operations() {
        let err = Operation::GetReview.translate(stopped(404, "Review not found"));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Failed to fetch review: review not found");

        let err = Operation::ListReviews.translate(stopped(404, "Not Found"));
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Failed to fetch reviews: Not Found");
    }

    #[test]
    fn test_service_unavailable_names_feature() {
        let err = Operation::SuggestReply.translate(stopped(503, "AI service not configured"));
        match &err {
            ApiError::Unavailable { feature, .. } => assert_eq!(*feature, Feature::AiReplies),
            other => panic!("expected unavailable, got {other:?}"),
        }
        assert!(err.to_string().starts_with("Failed to generate reply: AI unavailable"));

        let err = Operation::Search.translate(stopped(503, "disabled"));
        assert!(err.to_string().contains("Search unavailable"));

        let err = Operation::Analytics.translate(stopped(503, "disabled"));
        assert!(err.to_string().contains("Analytics unavailable"));

        let err = Operation::ProcessReviews.translate(stopped(503, "disabled"));
        assert!(err.to_string().contains("Batch processing unavailable"));

        let err = Operation::IngestReviews.translate(stopped(503, "AI down"));
        assert!(!err.is_unavailable());
        assert_eq!(err.to_string(), "Failed to ingest reviews: AI down");
    }

    #[test]
    fn test_exhausted_failure_keeps_attempts() {
        let source = ClassifiedError::classify(false, status(500), None, Some("boom"));
        let err = Operation::HealthCheck.translate(RetryError::Exhausted { attempts: 4, source });

        assert_eq!(err.attempts(), 4);
        assert_eq!(err.category(), Some(ApiErrorCategory::ServerError));
        assert_eq!(err.to_string(), "Health check failed: boom");
    }

    #[test]
    fn test_not_found_after_retries_keeps_attempts() {
        let body = json!({ "detail": "nope" });
        let source = ClassifiedError::classify(false, status(404), Some(&body), None);
        let err = Operation::GetReview.translate(RetryError::NonRetryable { attempts: 3, source });

        assert!(err.is_not_found());
        assert_eq!(err.attempts(), 3);

        let source = ClassifiedError::classify(false, status(503), Some(&body), None);
        let err = Operation::Search.translate(RetryError::NonRetryable { attempts: 2, source });
        assert!(err.is_unavailable());
        assert_eq!(err.attempts(), 2);
    }

    #[test]
    fn test_config_error_converts() {
        let err = ApiError::from(ReviewDeskError::Config("bad url".into()));
        assert_eq!(err.to_string(), "Configuration error: bad url");
        assert_eq!(err.attempts(), 0);
    }
}
