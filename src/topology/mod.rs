// ABOUTME: Topology model: resolved descriptors, network segmentation, dependency graph.
// ABOUTME: Everything here is validated and immutable before any service launches.

mod descriptor;
mod error;
mod graph;
mod network;
mod resolve;

pub use descriptor::{Dependency, PortBinding, ServiceDescriptor, VolumeSpec};
pub use error::ConfigError;
pub use graph::{DependencyGraph, Edge};
pub use network::NetworkTopology;
pub use resolve::{ResolvedTopology, resolve};

pub use crate::config::RequiredState;
