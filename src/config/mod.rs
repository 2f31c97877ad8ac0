// ABOUTME: Topology configuration types and parsing for cellrig.yml.
// ABOUTME: Handles YAML parsing, env bindings, and per-service declarations.

mod env_value;
mod probe;
mod service;

pub use env_value::{EnvValue, ServiceField};
pub use probe::{ProbeCheck, ProbeConfig};
pub use service::{DependsOnEntry, RequiredState, ServiceConfig};

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "cellrig.yml";
pub const CONFIG_FILENAME_ALT: &str = "cellrig.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".cellrig/config.yml";

/// The declarative fleet topology: named networks plus one entry per service.
///
/// Service names and network names are validated during resolution, not at
/// parse time, so that every reference error carries the offending service.
#[derive(Debug, Clone, Deserialize)]
pub struct TopologyConfig {
    /// Fleet name, used for container labels and network name prefixes.
    #[serde(default = "default_fleet_name")]
    pub fleet: String,

    /// Declared virtual networks. Every network a service joins must
    /// appear here.
    #[serde(default)]
    pub networks: HashMap<String, NetworkDecl>,

    pub services: HashMap<String, ServiceConfig>,

    /// Global convergence deadline for `up`.
    #[serde(default = "default_up_timeout", with = "humantime_serde")]
    pub up_timeout: Duration,

    /// Default stop timeout for teardown, overridable per service.
    #[serde(default = "default_stop_timeout", with = "humantime_serde")]
    pub stop_timeout: Duration,
}

fn default_fleet_name() -> String {
    "cellrig".to_string()
}

fn default_up_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_stop_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Declaration of a virtual network. Empty today; a placeholder for
/// driver options so `networks: { foo: {} }` stays forward-compatible.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkDecl {
    #[serde(default)]
    pub driver: Option<String>,
}

impl TopologyConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }
}

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, TEMPLATE_YAML)?;

    Ok(())
}

const TEMPLATE_YAML: &str = r#"fleet: my-cell

networks:
  core-net: {}

services:
  store:
    image: my-registry/store:latest
    networks: [core-net]
    ports: ["8010:8010"]
    probe:
      http: { path: /healthz, port: 8010 }
      interval: 5s
      retries: 6

  server:
    image: my-registry/server:latest
    networks: [core-net]
    depends_on:
      - service: store
        state: healthy
    env:
      STORE_URL: { service: store, field: url }
"#;
