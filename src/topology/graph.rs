// ABOUTME: Dependency graph over service descriptors.
// ABOUTME: Validates references, rejects cycles, answers ordering queries.

use super::descriptor::ServiceDescriptor;
use super::error::ConfigError;
use super::network::NetworkTopology;
use crate::config::RequiredState;
use crate::types::ServiceName;
use nonempty::NonEmpty;
use std::collections::{BTreeMap, BTreeSet};

/// Directed dependency graph: an edge `A -> B` means "A requires B in state
/// `required` before A may start". Immutable once built; rebuilding requires
/// a fresh descriptor set.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Outgoing edges: service -> its dependencies.
    dependencies: BTreeMap<ServiceName, Vec<Edge>>,
    /// Incoming edges: service -> the services that depend on it.
    dependents: BTreeMap<ServiceName, BTreeSet<ServiceName>>,
}

/// A single dependency edge.
#[derive(Debug, Clone)]
pub struct Edge {
    pub to: ServiceName,
    pub required: RequiredState,
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

impl DependencyGraph {
    /// Build and validate the graph from resolved descriptors.
    ///
    /// Validation order: unknown references first, then self-edges, then
    /// network reachability, then cycles. All are configuration errors; the
    /// fleet never starts on any of them.
    pub fn build(
        descriptors: &[ServiceDescriptor],
        networks: &NetworkTopology,
    ) -> Result<Self, ConfigError> {
        let known: BTreeSet<&ServiceName> = descriptors.iter().map(|d| &d.name).collect();

        let mut dependencies: BTreeMap<ServiceName, Vec<Edge>> = BTreeMap::new();
        let mut dependents: BTreeMap<ServiceName, BTreeSet<ServiceName>> = BTreeMap::new();

        for desc in descriptors {
            dependencies.entry(desc.name.clone()).or_default();
            dependents.entry(desc.name.clone()).or_default();
        }

        for desc in descriptors {
            for dep in &desc.depends_on {
                if !known.contains(&dep.on) {
                    return Err(ConfigError::UnknownDependency {
                        service: desc.name.clone(),
                        dependency: dep.on.to_string(),
                    });
                }
                if dep.on == desc.name {
                    return Err(ConfigError::SelfDependency {
                        service: desc.name.clone(),
                    });
                }
                // A dependent that shares no network with its dependency could
                // never observe its readiness; fail fast instead of hanging.
                if !networks.reachable(&desc.name, &dep.on) {
                    return Err(ConfigError::UnreachableDependency {
                        service: desc.name.clone(),
                        dependency: dep.on.clone(),
                    });
                }

                dependencies
                    .get_mut(&desc.name)
                    .expect("node inserted above")
                    .push(Edge {
                        to: dep.on.clone(),
                        required: dep.required,
                    });
                dependents
                    .get_mut(&dep.on)
                    .expect("node inserted above")
                    .insert(desc.name.clone());
            }
        }

        let graph = Self {
            dependencies,
            dependents,
        };
        graph.check_acyclic()?;
        Ok(graph)
    }

    /// Three-color depth-first search. A back-edge to an in-progress node is
    /// a cycle; the error names the cycle's member chain.
    fn check_acyclic(&self) -> Result<(), ConfigError> {
        let mut marks: BTreeMap<&ServiceName, Mark> = self
            .dependencies
            .keys()
            .map(|n| (n, Mark::Unvisited))
            .collect();

        for node in self.dependencies.keys() {
            if marks[node] == Mark::Unvisited {
                let mut path = Vec::new();
                self.visit(node, &mut marks, &mut path)?;
            }
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        node: &'a ServiceName,
        marks: &mut BTreeMap<&'a ServiceName, Mark>,
        path: &mut Vec<&'a ServiceName>,
    ) -> Result<(), ConfigError> {
        marks.insert(node, Mark::InProgress);
        path.push(node);

        for edge in &self.dependencies[node] {
            match marks[&edge.to] {
                Mark::Done => {}
                Mark::Unvisited => self.visit(&edge.to, marks, path)?,
                Mark::InProgress => {
                    // Trim the path to the cycle members and close the loop.
                    let start = path
                        .iter()
                        .position(|n| *n == &edge.to)
                        .expect("in-progress node is on the path");
                    let mut chain: Vec<ServiceName> =
                        path[start..].iter().map(|n| (*n).clone()).collect();
                    chain.push(edge.to.clone());
                    return Err(ConfigError::CyclicDependency {
                        chain: NonEmpty::from_vec(chain)
                            .expect("cycle has at least one member"),
                    });
                }
            }
        }

        path.pop();
        marks.insert(node, Mark::Done);
        Ok(())
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceName> {
        self.dependencies.keys()
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Outgoing dependency edges of a service.
    pub fn dependencies_of(&self, service: &ServiceName) -> &[Edge] {
        self.dependencies
            .get(service)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Direct dependents of a service.
    pub fn dependents_of(&self, service: &ServiceName) -> impl Iterator<Item = &ServiceName> {
        self.dependents.get(service).into_iter().flatten()
    }

    /// All transitive dependents of a service, excluding the service itself.
    pub fn transitive_dependents(&self, service: &ServiceName) -> BTreeSet<ServiceName> {
        let mut result = BTreeSet::new();
        let mut stack: Vec<&ServiceName> = self.dependents_of(service).collect();
        while let Some(node) = stack.pop() {
            if result.insert(node.clone()) {
                stack.extend(self.dependents_of(node));
            }
        }
        result
    }

    /// Dependencies-first order (a valid launch order for a sequential
    /// walker). Deterministic: ties broken by name.
    pub fn startup_order(&self) -> Vec<ServiceName> {
        let mut order = Vec::with_capacity(self.dependencies.len());
        let mut done: BTreeSet<&ServiceName> = BTreeSet::new();

        // The graph is known acyclic here, so the postorder walk terminates.
        fn walk<'a>(
            graph: &'a DependencyGraph,
            node: &'a ServiceName,
            done: &mut BTreeSet<&'a ServiceName>,
            order: &mut Vec<ServiceName>,
        ) {
            if !done.insert(node) {
                return;
            }
            for edge in graph.dependencies_of(node) {
                walk(graph, &edge.to, done, order);
            }
            order.push(node.clone());
        }

        for node in self.dependencies.keys() {
            walk(self, node, &mut done, &mut order);
        }
        order
    }

    /// Dependents-first order: the mirror invariant of startup. For every
    /// edge `A -> B`, A appears at or before B.
    pub fn teardown_order(&self) -> Vec<ServiceName> {
        let mut order = self.startup_order();
        order.reverse();
        order
    }
}
