use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Method, StatusCode};
use reviewdesk_domain::constants::DEFAULT_REQUEST_TIMEOUT_MS;
use reviewdesk_domain::{ApiConfig, ReviewDeskError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Primitive value carried in a query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Int(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u8> for QueryValue {
    fn from(value: u8) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Everything needed to issue one HTTP call
///
/// Built once per logical operation. Only the attempt counter changes
/// between retries.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    query: BTreeMap<String, QueryValue>,
    body: Option<Value>,
    attempt: u32,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: BTreeMap::new(), body: None, attempt: 0 }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Set a query parameter, replacing any previous value for `key`
    pub fn query(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Set a query parameter only when a value is present
    pub fn query_opt<V: Into<QueryValue>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Set a text query parameter only when it is present and not blank
    pub fn query_text(self, key: impl Into<String>, value: Option<&str>) -> Self {
        self.query_opt(key, value.filter(|text| !text.trim().is_empty()))
    }

    pub fn json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Copy of this descriptor stamped with the given 0-based attempt number
    pub fn with_attempt(&self, attempt: u32) -> Self {
        Self { attempt, ..self.clone() }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &BTreeMap<String, QueryValue> {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn is_idempotent(&self) -> bool {
        matches!(self.method, Method::GET | Method::HEAD | Method::OPTIONS)
    }

    fn query_pairs(&self) -> Vec<(&str, String)> {
        self.query.iter().map(|(key, value)| (key.as_str(), value.to_string())).collect()
    }
}

/// A response received from the service, whatever its status
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    status: StatusCode,
    body: Value,
    elapsed: Duration,
}

impl ResponseEnvelope {
    pub fn new(status: StatusCode, body: Value, elapsed: Duration) -> Self {
        Self { status, body, elapsed }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Parsed body: JSON when the payload parses, a JSON string holding the
    /// raw text otherwise, `null` when empty
    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }
}

/// Why no response was received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Other,
}

/// Failure to obtain any response from the service
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
    elapsed: Duration,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>, elapsed: Duration) -> Self {
        Self { kind, message: message.into(), elapsed }
    }

    fn from_reqwest(err: &reqwest::Error, timeout: Duration, elapsed: Duration) -> Self {
        if err.is_timeout() {
            return Self::new(
                TransportErrorKind::Timeout,
                format!(
                    "request timed out after {}ms, please try again",
                    timeout.as_millis()
                ),
                elapsed,
            );
        }
        let kind =
            if err.is_connect() { TransportErrorKind::Connect } else { TransportErrorKind::Other };
        Self::new(kind, format!("HTTP request failed: {err}"), elapsed)
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}

/// Single-attempt HTTP transport for the review service
///
/// Every request carries the bearer credential and JSON content headers and
/// is bounded by the configured timeout. Retrying is the caller's concern.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Build a client from the API section of the application config.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ReviewDeskError> {
        Self::builder()
            .base_url(&config.base_url)
            .api_key(&config.api_key)
            .timeout(config.timeout())
            .build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform exactly one HTTP call for `request`.
    ///
    /// Any status code counts as a received response. Only failures where
    /// nothing came back (timeout, refused connection, DNS) are errors.
    pub async fn send(&self, request: &RequestDescriptor) -> Result<ResponseEnvelope, TransportError> {
        let url = format!("{}{}", self.base_url, request.path());
        let method = request.method().clone();
        let attempt = request.attempt() + 1;

        let mut builder = self.client.request(method.clone(), &url);
        if !request.query_params().is_empty() {
            builder = builder.query(&request.query_pairs());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let started = Instant::now();
        debug!(attempt, %method, %url, "sending HTTP request");

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                let error = TransportError::from_reqwest(&err, self.timeout, started.elapsed());
                debug!(
                    attempt,
                    %method,
                    %url,
                    elapsed_ms = error.elapsed().as_millis() as u64,
                    error = %err,
                    "HTTP request failed"
                );
                return Err(error);
            }
        };

        let status = response.status();
        let bytes = response.bytes().await.map_err(|err| {
            TransportError::from_reqwest(&err, self.timeout, started.elapsed())
        })?;
        let elapsed = started.elapsed();

        debug!(
            attempt,
            %method,
            %url,
            %status,
            elapsed_ms = elapsed.as_millis() as u64,
            "received HTTP response"
        );

        Ok(ResponseEnvelope::new(status, parse_body(&bytes), elapsed))
    }
}

fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, ReviewDeskError> {
        let base_url = self
            .base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ReviewDeskError::Config("API base URL not set".into()))?;
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ReviewDeskError::Config("API key not set".into()))?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| ReviewDeskError::Config("API key contains invalid characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder =
            ReqwestClient::builder().timeout(self.timeout).default_headers(headers).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder
            .build()
            .map_err(|err| ReviewDeskError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(HttpClient { client, base_url, timeout: self.timeout })
    }
}
