//! Structured logging bootstrap
//!
//! Installs a global `tracing` subscriber: a `fmt` layer (human-readable or
//! JSON lines) behind an `EnvFilter`. `RUST_LOG` wins over the configured
//! level when set.

use std::sync::OnceLock;

use reviewdesk_domain::constants::DEFAULT_LOG_LEVEL;
use reviewdesk_domain::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<bool> = OnceLock::new();

/// Initialize logging once per process
///
/// Later calls are no-ops. Returns `true` if the subscriber installed by the
/// first call is ours, `false` if another global subscriber was already set.
pub fn init_logging(config: &LoggingConfig) -> bool {
    *LOGGER_INITIALIZED.get_or_init(|| {
        let fmt_layer = if config.json {
            fmt::layer().json().with_target(true).with_current_span(true).boxed()
        } else {
            fmt::layer().with_target(true).boxed()
        };

        let installed = tracing_subscriber::registry()
            .with(fmt_layer)
            .with(build_filter(&config.level))
            .try_init()
            .is_ok();

        if installed {
            tracing::info!(level = %config.level, json = config.json, "Logging initialized");
        } else {
            tracing::debug!("Global tracing subscriber already set, keeping it");
        }
        installed
    })
}

/// Filter from `RUST_LOG` when set and valid, else from `level`
///
/// An unparseable `level` falls back to `info`.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_for_level(level))
}

fn filter_for_level(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}
