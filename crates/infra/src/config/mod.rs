//! Configuration loading
//!
//! Builds a [`reviewdesk_domain::Config`] from environment variables or a
//! JSON/TOML file.

pub mod loader;

// Re-export commonly used items
pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
