// ABOUTME: Fully-resolved immutable service descriptors.
// ABOUTME: Output of the resolution pass; the scheduler's only view of a service.

use crate::config::{ProbeConfig, RequiredState};
use crate::types::{ImageRef, NetworkName, ServiceName};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

/// One service, after name resolution and validation. Immutable once built;
/// rebuilding requires a fresh configuration.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    pub name: ServiceName,
    pub image: ImageRef,
    pub networks: BTreeSet<NetworkName>,
    /// Ordered dependency list; order has no scheduling meaning but is kept
    /// stable for reporting.
    pub depends_on: Vec<Dependency>,
    pub ports: Vec<PortBinding>,
    pub volumes: Vec<VolumeSpec>,
    /// Environment, with service references and host env vars already
    /// substituted.
    pub env: HashMap<String, String>,
    pub labels: HashMap<String, String>,
    pub command: Option<Vec<String>>,
    pub probe: Option<ProbeConfig>,
    pub launch_retries: u32,
    pub stop_timeout: Option<Duration>,
}

impl ServiceDescriptor {
    /// The state this node itself must reach for the fleet to converge:
    /// healthy when a probe is declared, started otherwise.
    pub fn convergence_target(&self) -> RequiredState {
        if self.probe.is_some() {
            RequiredState::Healthy
        } else {
            RequiredState::Started
        }
    }
}

/// An edge declaration: this service requires `on` in state `required`
/// before it may start.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub on: ServiceName,
    pub required: RequiredState,
}

/// A parsed port mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortBinding {
    pub host: Option<u16>,
    pub container: u16,
    pub udp: bool,
}

impl PortBinding {
    /// Parse "8080:80", "80", or "8080:80/udp".
    pub fn parse(spec: &str) -> Option<Self> {
        let (ports, udp) = match spec.split_once('/') {
            Some((p, "udp")) => (p, true),
            Some((p, "tcp")) => (p, false),
            Some(_) => return None,
            None => (spec, false),
        };

        match ports.split_once(':') {
            Some((host, container)) => Some(Self {
                host: Some(host.parse().ok()?),
                container: container.parse().ok()?,
                udp,
            }),
            None => Some(Self {
                host: None,
                container: ports.parse().ok()?,
                udp,
            }),
        }
    }
}

/// A parsed volume mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSpec {
    pub source: String,
    pub target: String,
    pub read_only: bool,
}

impl VolumeSpec {
    /// Parse "source:target" or "source:target:ro".
    pub fn parse(spec: &str) -> Option<Self> {
        let parts: Vec<&str> = spec.split(':').collect();
        match parts.as_slice() {
            [source, target] => Some(Self {
                source: (*source).to_string(),
                target: (*target).to_string(),
                read_only: false,
            }),
            [source, target, mode] => Some(Self {
                source: (*source).to_string(),
                target: (*target).to_string(),
                read_only: *mode == "ro",
            }),
            _ => None,
        }
    }
}
