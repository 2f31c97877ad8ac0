// ABOUTME: Configuration-time error taxonomy for topology validation.
// ABOUTME: All of these are fatal before launch; the fleet never partially starts.

use crate::types::{NetworkNameError, ParseImageRefError, ServiceName, ServiceNameError};
use nonempty::NonEmpty;
use thiserror::Error;

/// Errors detected while resolving and validating a topology.
///
/// Every variant aborts `up` before any node launches.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid service name '{name}': {source}")]
    InvalidServiceName {
        name: String,
        source: ServiceNameError,
    },

    #[error("invalid network name '{name}': {source}")]
    InvalidNetworkName {
        name: String,
        source: NetworkNameError,
    },

    #[error("service '{service}': invalid image reference: {source}")]
    InvalidImage {
        service: ServiceName,
        source: ParseImageRefError,
    },

    #[error("service '{service}' joins undeclared network '{network}'")]
    UnknownNetwork {
        service: ServiceName,
        network: String,
    },

    #[error("service '{service}' joins no networks and would be unobservable")]
    NoNetworks { service: ServiceName },

    #[error("service '{service}': invalid port mapping '{spec}'")]
    InvalidPort { service: ServiceName, spec: String },

    #[error("service '{service}': invalid volume mount '{spec}'")]
    InvalidVolume { service: ServiceName, spec: String },

    #[error("service '{service}' references unknown service '{referenced}' in env")]
    UnknownServiceRef {
        service: ServiceName,
        referenced: String,
    },

    #[error("service '{service}' references port of '{referenced}', which exposes none")]
    NoPortsForReference {
        service: ServiceName,
        referenced: ServiceName,
    },

    #[error("service '{service}': missing required environment variable: {var}")]
    MissingEnvVar { service: ServiceName, var: String },

    #[error("service '{service}' depends on unknown service '{dependency}'")]
    UnknownDependency {
        service: ServiceName,
        dependency: String,
    },

    #[error("service '{service}' depends on itself")]
    SelfDependency { service: ServiceName },

    #[error("cyclic dependency: {}", format_chain(chain))]
    CyclicDependency { chain: NonEmpty<ServiceName> },

    #[error(
        "service '{service}' depends on '{dependency}' but shares no network with it, \
         so it could never observe its readiness"
    )]
    UnreachableDependency {
        service: ServiceName,
        dependency: ServiceName,
    },
}

fn format_chain(chain: &NonEmpty<ServiceName>) -> String {
    chain
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}
