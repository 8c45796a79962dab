//! Review service API client
//!
//! One method per business action. Each validates its input, runs the
//! request through the retry executor and turns the final failure into an
//! [`ApiError`] carrying an operation-specific message.

use std::sync::Arc;
use std::time::Instant;

use reviewdesk_common::resilience::RetryExecutor;
use reviewdesk_domain::constants::{MAX_RATING, MIN_RATING};
use reviewdesk_domain::{
    Analytics, ApiConfig, HealthReport, IngestOutcome, NewReview, Pagination, ProcessOutcome,
    Review, ReviewFilters, ReviewPage, SearchResults, SuggestedReply,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::errors::{ApiError, ClassifiedError, Operation};
use super::policy::{retry_executor, TransientFailurePolicy};
use crate::http::{HttpClient, RequestDescriptor};

#[derive(Serialize)]
struct IngestRequest<'a> {
    reviews: &'a [NewReview],
}

/// Client for the review service
///
/// Cheap to clone; clones share the underlying connection pool. Holds no
/// per-call state, so concurrent calls never interfere.
#[derive(Debug, Clone)]
pub struct ReviewsApiClient {
    http: Arc<HttpClient>,
    retry: Arc<RetryExecutor<TransientFailurePolicy>>,
}

impl ReviewsApiClient {
    /// Create a client from the API section of the configuration
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the base URL or API key is missing or
    /// the HTTP client cannot be built
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = HttpClient::from_config(config)?;
        Ok(Self::with_http_client(http, retry_executor(config)))
    }

    pub fn builder() -> ReviewsApiClientBuilder {
        ReviewsApiClientBuilder::default()
    }

    /// Assemble a client from pre-built parts
    pub fn with_http_client(
        http: HttpClient,
        retry: RetryExecutor<TransientFailurePolicy>,
    ) -> Self {
        Self { http: Arc::new(http), retry: Arc::new(retry) }
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Fetch one page of reviews
    ///
    /// Missing pagination values default to page 1 of size 10. Blank text
    /// filters are not sent.
    #[instrument(skip(self, filters), fields(page = pagination.page(), size = pagination.size()))]
    pub async fn list_reviews(
        &self,
        filters: &ReviewFilters,
        pagination: Pagination,
    ) -> Result<ReviewPage, ApiError> {
        let request = RequestDescriptor::get("/reviews")
            .query("page", pagination.page())
            .query("page_size", pagination.size())
            .query_text("location", filters.location.as_deref())
            .query_text("sentiment", filters.sentiment.as_deref())
            .query_text("q", filters.search.as_deref())
            .query_opt("rating_min", filters.rating_min)
            .query_opt("rating_max", filters.rating_max)
            .query_text("date_from", filters.date_from.as_deref())
            .query_text("date_to", filters.date_to.as_deref());

        let page: ReviewPage = self.execute(Operation::ListReviews, request).await?;
        debug!(returned = page.reviews.len(), total = page.total, "Fetched reviews page");
        Ok(page)
    }

    /// Fetch a single review
    ///
    /// A 404 from the service yields [`ApiError::NotFound`].
    #[instrument(skip(self))]
    pub async fn get_review(&self, id: i64) -> Result<Review, ApiError> {
        self.execute(Operation::GetReview, RequestDescriptor::get(format!("/reviews/{id}"))).await
    }

    /// Submit reviews for ingestion and AI annotation
    ///
    /// Empty input and ratings outside 1..=5 are rejected without a call.
    #[instrument(skip(self, reviews), fields(count = reviews.len()))]
    pub async fn ingest_reviews(&self, reviews: &[NewReview]) -> Result<IngestOutcome, ApiError> {
        let operation = Operation::IngestReviews;

        if reviews.is_empty() {
            return Err(operation.invalid("reviews must be a non-empty list"));
        }
        if let Some(review) = reviews.iter().find(|review| !review.has_valid_rating()) {
            return Err(operation.invalid(format!(
                "review {} has rating {}, expected {MIN_RATING}..={MAX_RATING}",
                review.id, review.rating
            )));
        }

        let body = serde_json::to_value(IngestRequest { reviews })
            .map_err(|err| operation.invalid(format!("could not encode reviews: {err}")))?;

        let mut outcome: IngestOutcome =
            self.execute(operation, RequestDescriptor::post("/ingest").json_body(body)).await?;
        outcome.submitted = reviews.len();
        Ok(outcome)
    }

    /// Ask the AI service for a reply to a review
    #[instrument(skip(self))]
    pub async fn suggest_reply(&self, id: i64) -> Result<SuggestedReply, ApiError> {
        let request = RequestDescriptor::post(format!("/reviews/{id}/suggest-reply"));
        self.execute(Operation::SuggestReply, request).await
    }

    #[instrument(skip(self))]
    pub async fn get_analytics(&self) -> Result<Analytics, ApiError> {
        self.execute(Operation::Analytics, RequestDescriptor::get("/analytics")).await
    }

    /// Find reviews similar to `query`
    ///
    /// A blank query is rejected without a call; any other query is sent as
    /// given. `k` is forwarded only when given, leaving the default result
    /// count to the service.
    #[instrument(skip(self))]
    pub async fn search_similar(&self, query: &str, k: Option<u32>) -> Result<SearchResults, ApiError> {
        let operation = Operation::Search;
        if query.trim().is_empty() {
            return Err(operation.invalid("query must not be empty"));
        }

        let request = RequestDescriptor::get("/search").query("q", query).query_opt("k", k);
        self.execute(operation, request).await
    }

    /// Run AI processing over every stored review
    #[instrument(skip(self))]
    pub async fn process_reviews(&self) -> Result<ProcessOutcome, ApiError> {
        self.execute(Operation::ProcessReviews, RequestDescriptor::post("/process-reviews")).await
    }

    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<HealthReport, ApiError> {
        self.execute(Operation::HealthCheck, RequestDescriptor::get("/health")).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: RequestDescriptor,
    ) -> Result<T, ApiError> {
        let started = Instant::now();
        let http = &self.http;

        let outcome = self
            .retry
            .execute(|attempt| {
                let http = Arc::clone(http);
                let request = request.with_attempt(attempt);
                async move {
                    if attempt > 0 && !request.is_idempotent() {
                        warn!(
                            operation = %operation,
                            method = %request.method(),
                            attempt = attempt + 1,
                            "Retrying non-idempotent request"
                        );
                    }

                    let response = match http.send(&request).await {
                        Ok(response) => response,
                        Err(err) => return Err(ClassifiedError::from_transport(&err)),
                    };
                    if !response.is_success() {
                        return Err(ClassifiedError::from_response(&response));
                    }
                    response.decode::<T>().map_err(|err| ClassifiedError::decode_failure(&response, &err))
                }
            })
            .await;

        match outcome {
            Ok(value) => {
                info!(
                    operation = %operation,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "API call succeeded"
                );
                Ok(value)
            }
            Err(err) => {
                let error = operation.translate(err);
                warn!(
                    operation = %operation,
                    category = ?error.category(),
                    attempts = error.attempts(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %error,
                    "API call failed"
                );
                Err(error)
            }
        }
    }
}

/// Builder for [`ReviewsApiClient`]
#[derive(Debug, Default)]
pub struct ReviewsApiClientBuilder {
    config: Option<ApiConfig>,
    user_agent: Option<String>,
}

impl ReviewsApiClientBuilder {
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns error if no config was given or the HTTP client cannot be
    /// created from it
    pub fn build(self) -> Result<ReviewsApiClient, ApiError> {
        let config = self.config.ok_or_else(|| ApiError::Config("API config not set".into()))?;

        let mut http = HttpClient::builder()
            .base_url(&config.base_url)
            .api_key(&config.api_key)
            .timeout(config.timeout());
        if let Some(agent) = self.user_agent {
            http = http.user_agent(agent);
        }

        Ok(ReviewsApiClient::with_http_client(http.build()?, retry_executor(&config)))
    }
}
