// ABOUTME: Readiness probe configuration for a service.
// ABOUTME: HTTP or command probes with per-service thresholds.

use serde::Deserialize;
use std::time::Duration;

/// Readiness probe declaration. Thresholds are per-service configuration;
/// the defaults below are only serde fallbacks, never a hidden global policy.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    #[serde(flatten)]
    pub check: ProbeCheck,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Consecutive failures tolerated before the service is marked failed.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Grace delay after start before the first poll.
    #[serde(default = "default_start_period", with = "humantime_serde")]
    pub start_period: Duration,
}

/// What the probe actually does.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeCheck {
    /// GET a path on a published host port; 2xx means healthy.
    Http { path: String, port: u16 },
    /// Run a shell command inside the container; exit 0 means healthy.
    Cmd(String),
}

fn default_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_retries() -> u32 {
    3
}

fn default_start_period() -> Duration {
    Duration::from_secs(30)
}
