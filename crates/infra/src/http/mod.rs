//! Single-attempt HTTP transport
//!
//! Knows nothing about retries or review semantics. Retrying and error
//! classification live in [`crate::api`].

pub mod client;

pub use client::{
    HttpClient, HttpClientBuilder, QueryValue, RequestDescriptor, ResponseEnvelope,
    TransportError, TransportErrorKind,
};
