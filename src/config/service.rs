// ABOUTME: Per-service declaration within a topology.
// ABOUTME: Image, networks, dependencies with required states, ports, env.

use super::env_value::EnvValue;
use super::probe::ProbeConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// One service entry in `cellrig.yml`. The internal behavior of the service
/// is opaque; only its image, reachability, and readiness contract matter.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub image: String,

    /// Networks this service joins. A service with no networks can neither
    /// observe nor be observed, so at least one is required.
    pub networks: Vec<String>,

    #[serde(default)]
    pub depends_on: Vec<DependsOnEntry>,

    /// Port mappings, "host:container" or "host:container/udp".
    #[serde(default)]
    pub ports: Vec<String>,

    /// Volume mounts, "source:target" or "source:target:ro". Contents are
    /// opaque to cellrig; only existence across restarts matters.
    #[serde(default)]
    pub volumes: Vec<String>,

    #[serde(default)]
    pub env: HashMap<String, EnvValue>,

    #[serde(default)]
    pub labels: HashMap<String, String>,

    #[serde(default)]
    pub command: Option<Vec<String>>,

    #[serde(default)]
    pub probe: Option<ProbeConfig>,

    /// Explicit launch retry budget. Launch failures are never retried
    /// implicitly; zero means one attempt.
    #[serde(default)]
    pub launch_retries: u32,

    #[serde(default, with = "humantime_serde::option")]
    pub stop_timeout: Option<Duration>,
}

/// A dependency declaration. Accepts a bare service name as shorthand for
/// `{ service: <name>, state: started }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "DependsOnRepr")]
pub struct DependsOnEntry {
    pub service: String,
    pub state: RequiredState,
}

/// The state a dependency must reach before the dependent may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredState {
    /// The dependency's process has been launched.
    #[default]
    Started,
    /// The dependency's readiness probe has reported success at least once.
    Healthy,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DependsOnRepr {
    Name(String),
    Full {
        service: String,
        #[serde(default)]
        state: RequiredState,
    },
}

impl From<DependsOnRepr> for DependsOnEntry {
    fn from(repr: DependsOnRepr) -> Self {
        match repr {
            DependsOnRepr::Name(service) => DependsOnEntry {
                service,
                state: RequiredState::Started,
            },
            DependsOnRepr::Full { service, state } => DependsOnEntry { service, state },
        }
    }
}
