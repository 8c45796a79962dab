//! Observability infrastructure
//!
//! Structured logging bootstrap. Instrumentation itself is plain `tracing`
//! calls and `#[instrument]` spans next to the code they describe.

pub mod logging;

pub use logging::{build_filter, init_logging};
