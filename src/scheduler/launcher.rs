// ABOUTME: The launch seam between the scheduler and the container runtime.

use crate::topology::ServiceDescriptor;
use crate::types::ContainerId;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum LaunchError {
    #[error("image pull failed: {message}")]
    ImagePull { message: String },

    #[error("network setup failed: {message}")]
    Network { message: String },

    #[error("container launch failed: {message}")]
    Container { message: String },
}

/// Brings one service up: image, networks, container create and start.
///
/// A launch is all-or-nothing from the scheduler's point of view; retries
/// and failure reporting are the scheduler's job.
#[async_trait]
pub trait Launcher: Send + Sync + 'static {
    async fn launch(&self, descriptor: &ServiceDescriptor) -> Result<ContainerId, LaunchError>;
}
