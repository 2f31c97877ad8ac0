// ABOUTME: Resolution pass from raw configuration to immutable descriptors.
// ABOUTME: Substitutes env bindings and validates every name before graph building.

use super::descriptor::{Dependency, PortBinding, ServiceDescriptor, VolumeSpec};
use super::error::ConfigError;
use super::graph::DependencyGraph;
use super::network::NetworkTopology;
use crate::config::{EnvValue, ServiceField, TopologyConfig};
use crate::types::{ImageRef, NetworkName, ServiceName};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A validated topology, ready for the scheduler: descriptors, segmentation
/// model, and dependency graph, all immutable.
#[derive(Debug, Clone)]
pub struct ResolvedTopology {
    pub descriptors: BTreeMap<ServiceName, ServiceDescriptor>,
    pub networks: NetworkTopology,
    pub graph: DependencyGraph,
}

impl ResolvedTopology {
    pub fn descriptor(&self, name: &ServiceName) -> Option<&ServiceDescriptor> {
        self.descriptors.get(name)
    }
}

/// Resolve a parsed configuration into descriptors and build the graph.
///
/// Inter-service env references are substituted here, at build time; launched
/// containers never see deferred placeholders. Any error aborts before a
/// single node launches.
pub fn resolve(config: &TopologyConfig) -> Result<ResolvedTopology, ConfigError> {
    let declared_networks = validate_networks(config)?;

    // First pass: names, so service references can be checked against the
    // full set before any single descriptor resolves.
    let mut names = BTreeMap::new();
    for raw_name in config.services.keys() {
        let name =
            ServiceName::new(raw_name).map_err(|source| ConfigError::InvalidServiceName {
                name: raw_name.clone(),
                source,
            })?;
        names.insert(raw_name.clone(), name);
    }

    let mut descriptors = BTreeMap::new();
    for (raw_name, svc) in &config.services {
        let name = names[raw_name].clone();

        let image = ImageRef::parse(&svc.image).map_err(|source| ConfigError::InvalidImage {
            service: name.clone(),
            source,
        })?;

        if svc.networks.is_empty() {
            return Err(ConfigError::NoNetworks {
                service: name.clone(),
            });
        }
        let mut networks = BTreeSet::new();
        for net in &svc.networks {
            let net_name =
                NetworkName::new(net).map_err(|source| ConfigError::InvalidNetworkName {
                    name: net.clone(),
                    source,
                })?;
            if !declared_networks.contains(&net_name) {
                return Err(ConfigError::UnknownNetwork {
                    service: name.clone(),
                    network: net.clone(),
                });
            }
            networks.insert(net_name);
        }

        let mut ports = Vec::with_capacity(svc.ports.len());
        for spec in &svc.ports {
            ports.push(
                PortBinding::parse(spec).ok_or_else(|| ConfigError::InvalidPort {
                    service: name.clone(),
                    spec: spec.clone(),
                })?,
            );
        }

        let mut volumes = Vec::with_capacity(svc.volumes.len());
        for spec in &svc.volumes {
            volumes.push(
                VolumeSpec::parse(spec).ok_or_else(|| ConfigError::InvalidVolume {
                    service: name.clone(),
                    spec: spec.clone(),
                })?,
            );
        }

        let env = resolve_env(&name, &svc.env, config)?;

        let depends_on = svc
            .depends_on
            .iter()
            .map(|d| {
                // Name validity only; existence is the graph builder's job.
                let on = names.get(&d.service).cloned().or_else(|| {
                    ServiceName::new(&d.service).ok()
                });
                on.map(|on| Dependency {
                    on,
                    required: d.state,
                })
                .ok_or_else(|| ConfigError::UnknownDependency {
                    service: name.clone(),
                    dependency: d.service.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        descriptors.insert(
            name.clone(),
            ServiceDescriptor {
                name,
                image,
                networks,
                depends_on,
                ports,
                volumes,
                env,
                labels: svc.labels.clone(),
                command: svc.command.clone(),
                probe: svc.probe.clone(),
                launch_retries: svc.launch_retries,
                stop_timeout: svc.stop_timeout,
            },
        );
    }

    let descriptor_list: Vec<ServiceDescriptor> = descriptors.values().cloned().collect();
    let networks = NetworkTopology::from_descriptors(&declared_networks, &descriptor_list);
    let graph = DependencyGraph::build(&descriptor_list, &networks)?;

    Ok(ResolvedTopology {
        descriptors,
        networks,
        graph,
    })
}

fn validate_networks(config: &TopologyConfig) -> Result<BTreeSet<NetworkName>, ConfigError> {
    let mut declared = BTreeSet::new();
    for raw in config.networks.keys() {
        let name = NetworkName::new(raw).map_err(|source| ConfigError::InvalidNetworkName {
            name: raw.clone(),
            source,
        })?;
        declared.insert(name);
    }
    Ok(declared)
}

/// Substitute env bindings for one service. `FromService` references resolve
/// against the raw configuration so resolution order doesn't matter.
fn resolve_env(
    service: &ServiceName,
    env: &HashMap<String, EnvValue>,
    config: &TopologyConfig,
) -> Result<HashMap<String, String>, ConfigError> {
    let mut resolved = HashMap::with_capacity(env.len());
    for (key, value) in env {
        let resolved_value = match value {
            EnvValue::Literal(s) => s.clone(),
            EnvValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(v) => v,
                Err(_) => default.clone().ok_or_else(|| ConfigError::MissingEnvVar {
                    service: service.clone(),
                    var: var.clone(),
                })?,
            },
            EnvValue::FromService {
                service: referenced,
                field,
            } => resolve_service_ref(service, referenced, *field, config)?,
        };
        resolved.insert(key.clone(), resolved_value);
    }
    Ok(resolved)
}

fn resolve_service_ref(
    service: &ServiceName,
    referenced: &str,
    field: ServiceField,
    config: &TopologyConfig,
) -> Result<String, ConfigError> {
    let target = config
        .services
        .get(referenced)
        .ok_or_else(|| ConfigError::UnknownServiceRef {
            service: service.clone(),
            referenced: referenced.to_string(),
        })?;
    let target_name =
        ServiceName::new(referenced).map_err(|source| ConfigError::InvalidServiceName {
            name: referenced.to_string(),
            source,
        })?;

    let first_port = || {
        target
            .ports
            .first()
            .and_then(|spec| PortBinding::parse(spec))
            .map(|p| p.container)
            .ok_or_else(|| ConfigError::NoPortsForReference {
                service: service.clone(),
                referenced: target_name.clone(),
            })
    };

    Ok(match field {
        ServiceField::Host => target_name.to_string(),
        ServiceField::Port => first_port()?.to_string(),
        ServiceField::Url => format!("http://{}:{}", target_name, first_port()?),
    })
}
