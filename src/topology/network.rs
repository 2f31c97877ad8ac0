// ABOUTME: Network segmentation model derived from service declarations.
// ABOUTME: Two services can exchange traffic iff their network sets intersect.

use super::descriptor::ServiceDescriptor;
use crate::types::{NetworkName, ServiceName};
use std::collections::{BTreeMap, BTreeSet};

/// Mapping from network name to member services, computed once from
/// descriptors and immutable at runtime. Purely derived data.
#[derive(Debug, Clone, Default)]
pub struct NetworkTopology {
    members: BTreeMap<NetworkName, BTreeSet<ServiceName>>,
    by_service: BTreeMap<ServiceName, BTreeSet<NetworkName>>,
}

impl NetworkTopology {
    /// Derive the topology from resolved descriptors. `declared` is the set
    /// of networks named in the configuration; networks nobody joins still
    /// appear, with empty member sets.
    pub fn from_descriptors(
        declared: &BTreeSet<NetworkName>,
        descriptors: &[ServiceDescriptor],
    ) -> Self {
        let mut members: BTreeMap<NetworkName, BTreeSet<ServiceName>> = declared
            .iter()
            .map(|n| (n.clone(), BTreeSet::new()))
            .collect();
        let mut by_service = BTreeMap::new();

        for desc in descriptors {
            for network in &desc.networks {
                members
                    .entry(network.clone())
                    .or_default()
                    .insert(desc.name.clone());
            }
            by_service.insert(desc.name.clone(), desc.networks.clone());
        }

        Self {
            members,
            by_service,
        }
    }

    /// Whether `a` can reach `b`: true iff they share at least one network.
    pub fn reachable(&self, a: &ServiceName, b: &ServiceName) -> bool {
        match (self.by_service.get(a), self.by_service.get(b)) {
            (Some(nets_a), Some(nets_b)) => nets_a.intersection(nets_b).next().is_some(),
            _ => false,
        }
    }

    pub fn networks_of(&self, service: &ServiceName) -> BTreeSet<NetworkName> {
        self.by_service.get(service).cloned().unwrap_or_default()
    }

    pub fn members_of(&self, network: &NetworkName) -> BTreeSet<ServiceName> {
        self.members.get(network).cloned().unwrap_or_default()
    }

    pub fn networks(&self) -> impl Iterator<Item = &NetworkName> {
        self.members.keys()
    }
}
