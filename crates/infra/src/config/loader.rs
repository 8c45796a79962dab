//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the required ones are missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `REVIEWDESK_API_BASE_URL` (required): Review service base URL
//! - `REVIEWDESK_API_KEY` (required): Bearer credential
//! - `REVIEWDESK_API_TIMEOUT_MS`: Per-attempt timeout in milliseconds
//! - `REVIEWDESK_API_MAX_RETRIES`: Retries after the first attempt
//! - `REVIEWDESK_API_BACKOFF_MS`: Linear backoff unit in milliseconds
//! - `REVIEWDESK_HEALTH_POLL_INTERVAL`: Health poll interval in seconds
//! - `REVIEWDESK_LOG_LEVEL`: Default log filter directive
//! - `REVIEWDESK_LOG_JSON`: Emit JSON log lines (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.{json,toml}` then `./reviewdesk.{json,toml}`
//! 2. The same names in the parent and grandparent directories
//! 3. The same names relative to the executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use reviewdesk_domain::{ApiConfig, Config, HealthConfig, LoggingConfig, Result, ReviewDeskError};

const FILE_NAMES: [&str; 4] = ["config.json", "config.toml", "reviewdesk.json", "reviewdesk.toml"];
const SEARCH_DIRS: [&str; 3] = [".", "..", "../.."];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `ReviewDeskError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value cannot be parsed
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The base URL and API key must be present; every other setting falls
/// back to its default when unset.
///
/// # Errors
/// Returns `ReviewDeskError::Config` if required variables are missing
/// or a value is invalid.
pub fn load_from_env() -> Result<Config> {
    let defaults = Config::default();

    let base_url = env_var("REVIEWDESK_API_BASE_URL")?;
    let api_key = env_var("REVIEWDESK_API_KEY")?;

    let api = ApiConfig {
        base_url,
        api_key,
        timeout_ms: env_parse("REVIEWDESK_API_TIMEOUT_MS", defaults.api.timeout_ms)?,
        max_retries: env_parse("REVIEWDESK_API_MAX_RETRIES", defaults.api.max_retries)?,
        backoff_base_ms: env_parse("REVIEWDESK_API_BACKOFF_MS", defaults.api.backoff_base_ms)?,
    };

    let health = HealthConfig {
        poll_interval_secs: env_parse(
            "REVIEWDESK_HEALTH_POLL_INTERVAL",
            defaults.health.poll_interval_secs,
        )?,
    };

    let logging = LoggingConfig {
        level: std::env::var("REVIEWDESK_LOG_LEVEL").unwrap_or(defaults.logging.level),
        json: env_bool("REVIEWDESK_LOG_JSON", defaults.logging.json),
    };

    Ok(Config { api, health, logging })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ReviewDeskError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ReviewDeskError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ReviewDeskError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ReviewDeskError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ReviewDeskError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ReviewDeskError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(ReviewDeskError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| {
            SEARCH_DIRS
                .iter()
                .flat_map(move |dir| FILE_NAMES.iter().map(move |name| root.join(dir).join(name)))
        })
        .find(|path| path.exists())
}

/// Get required, non-empty environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            ReviewDeskError::Config(format!("Missing required environment variable: {}", key))
        })
}

/// Parse an optional environment variable, using `default` when unset
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ReviewDeskError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
