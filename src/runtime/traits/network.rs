// ABOUTME: Network operations trait for container runtimes.
// ABOUTME: Create networks and connect containers with aliases.

use super::shared_types::NetworkConfig;
use crate::types::{ContainerId, NetworkId, ServiceName};
use async_trait::async_trait;

/// Network operations: create, connect.
#[async_trait]
pub trait NetworkOps: Send + Sync {
    /// Create a network.
    async fn create_network(&self, config: &NetworkConfig) -> Result<NetworkId, NetworkError>;

    /// Check if a network exists.
    async fn network_exists(&self, name: &str) -> Result<bool, NetworkError>;

    /// Connect a container to a network, aliased by service name.
    async fn connect_to_network(
        &self,
        container: &ContainerId,
        network: &NetworkId,
        aliases: &[ServiceName],
    ) -> Result<(), NetworkError>;
}

/// Errors from network operations.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("network not found: {0}")]
    NotFound(String),

    #[error("network already exists: {0}")]
    AlreadyExists(String),

    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
