// ABOUTME: Launcher implementation backed by the container runtime.
// ABOUTME: Pulls the image if absent, wires up networks, creates and starts.

use super::{LABEL_FLEET, LABEL_MANAGED, LABEL_SERVICE, container_name, physical_network_name};
use crate::runtime::{
    ContainerConfig, ContainerError, ContainerFilters, ContainerOps, ImageOps, NetworkOps,
    PortMapping, Protocol, VolumeMount,
};
use crate::scheduler::{LaunchError, Launcher};
use crate::topology::ServiceDescriptor;
use crate::types::{ContainerId, NetworkId};
use async_trait::async_trait;
use std::sync::Arc;

/// Brings one service up against a real runtime. All networks are expected
/// to exist already; the controller ensures them before the scheduler runs.
pub struct RuntimeLauncher<R> {
    runtime: Arc<R>,
    fleet: String,
}

impl<R> RuntimeLauncher<R> {
    pub fn new(runtime: Arc<R>, fleet: String) -> Self {
        Self { runtime, fleet }
    }
}

impl<R: ContainerOps> RuntimeLauncher<R> {
    /// Remove a leftover container with the given name from a previous run.
    async fn remove_stale(&self, name: &str) -> Result<(), LaunchError> {
        let filters = ContainerFilters {
            name: Some(name.to_string()),
            all: true,
            ..Default::default()
        };
        let stale = self
            .runtime
            .list_containers(&filters)
            .await
            .map_err(container_err)?;
        for container in stale {
            tracing::debug!(container = %container.name, "removing stale container");
            self.runtime
                .remove_container(&container.id, true)
                .await
                .map_err(container_err)?;
        }
        Ok(())
    }
}

#[async_trait]
impl<R> Launcher for RuntimeLauncher<R>
where
    R: ImageOps + ContainerOps + NetworkOps + Send + Sync + 'static,
{
    async fn launch(&self, descriptor: &ServiceDescriptor) -> Result<ContainerId, LaunchError> {
        let image_present = self
            .runtime
            .image_exists(&descriptor.image)
            .await
            .map_err(|e| LaunchError::ImagePull {
                message: e.to_string(),
            })?;
        if !image_present {
            tracing::info!(image = %descriptor.image, "pulling image");
            self.runtime
                .pull_image(&descriptor.image, None)
                .await
                .map_err(|e| LaunchError::ImagePull {
                    message: e.to_string(),
                })?;
        }

        let mut networks = descriptor.networks.iter();
        let primary = networks
            .next()
            .expect("resolution guarantees at least one network");
        let aliases = vec![descriptor.name.clone()];

        let mut labels = descriptor.labels.clone();
        labels.insert(LABEL_MANAGED.to_string(), "true".to_string());
        labels.insert(LABEL_SERVICE.to_string(), descriptor.name.to_string());
        labels.insert(LABEL_FLEET.to_string(), self.fleet.clone());

        let config = ContainerConfig {
            name: container_name(&self.fleet, &descriptor.name),
            image: descriptor.image.clone(),
            env: descriptor.env.clone(),
            labels,
            ports: descriptor
                .ports
                .iter()
                .map(|p| PortMapping {
                    host_port: p.host,
                    container_port: p.container,
                    protocol: if p.udp { Protocol::Udp } else { Protocol::Tcp },
                })
                .collect(),
            volumes: descriptor
                .volumes
                .iter()
                .map(|v| VolumeMount {
                    source: v.source.clone(),
                    target: v.target.clone(),
                    read_only: v.read_only,
                })
                .collect(),
            command: descriptor.command.clone(),
            stop_timeout: descriptor.stop_timeout,
            network: Some(physical_network_name(&self.fleet, primary)),
            network_aliases: aliases.clone(),
        };

        let id = match self.runtime.create_container(&config).await {
            Ok(id) => id,
            Err(ContainerError::AlreadyExists(_)) => {
                self.remove_stale(&config.name).await?;
                self.runtime
                    .create_container(&config)
                    .await
                    .map_err(container_err)?
            }
            Err(e) => return Err(container_err(e)),
        };

        // Secondary networks must be attached before start so the service
        // never runs partially segmented.
        for network in networks {
            let physical = NetworkId::new(physical_network_name(&self.fleet, network));
            self.runtime
                .connect_to_network(&id, &physical, &aliases)
                .await
                .map_err(|e| LaunchError::Network {
                    message: e.to_string(),
                })?;
        }

        self.runtime
            .start_container(&id)
            .await
            .map_err(container_err)?;

        Ok(id)
    }
}

fn container_err(e: ContainerError) -> LaunchError {
    LaunchError::Container {
        message: e.to_string(),
    }
}
