//! Service health payload and client-side connectivity status

use std::fmt;

use serde::{Deserialize, Serialize};

/// Body of the service health endpoint
///
/// The service reports `healthy`, `degraded` or `unhealthy`; only the status
/// is guaranteed to be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub ai_service: Option<serde_json::Value>,
    #[serde(default)]
    pub uptime: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Belief about whether the review service is reachable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityStatus {
    /// No answer yet since start-up or since connectivity returned
    #[default]
    Checking,
    Online,
    Offline,
}

impl ConnectivityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
