// ABOUTME: The controller behind up, down, and status.
// ABOUTME: Resolves, ensures networks, adopts running containers, schedules.

use super::launcher::RuntimeLauncher;
use super::{FleetError, LABEL_FLEET, LABEL_MANAGED, LABEL_SERVICE, physical_network_name};
use crate::config::TopologyConfig;
use crate::probe::{ProbeOutcome, ProbeRunner, RuntimeProber};
use crate::runtime::{
    ContainerFilters, ContainerOps, ContainerSummary, ImageOps, NetworkConfig, NetworkOps,
};
use crate::scheduler::{
    CancelHandle, FleetPhase, FleetStatus, NodePhase, RunEnd, Scheduler, ServiceRuntimeState,
};
use crate::topology::{ResolvedTopology, resolve};
use crate::types::{ContainerId, ServiceName};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Options for a bring-up run.
#[derive(Debug, Clone, Default)]
pub struct UpOptions {
    /// Overrides the configured convergence deadline.
    pub timeout: Option<Duration>,
}

/// Facade over the whole bring-up pipeline. Construction resolves and
/// validates the topology, so any configuration error is reported before a
/// single container is touched.
#[derive(Debug)]
pub struct FleetController<R> {
    runtime: Arc<R>,
    topology: Arc<ResolvedTopology>,
    config: TopologyConfig,
}

impl<R> FleetController<R> {
    pub fn new(runtime: Arc<R>, config: TopologyConfig) -> Result<Self, FleetError> {
        let topology = Arc::new(resolve(&config)?);
        Ok(Self {
            runtime,
            topology,
            config,
        })
    }

    pub fn topology(&self) -> &ResolvedTopology {
        &self.topology
    }

    pub fn fleet_name(&self) -> &str {
        &self.config.fleet
    }
}

impl<R> FleetController<R>
where
    R: ImageOps + ContainerOps + NetworkOps + Send + Sync + 'static,
{
    /// Bring the fleet up and wait for convergence.
    ///
    /// `register_cancel` receives the run's cancel handle before any launch
    /// is issued; the caller decides what triggers it (the CLI wires it to
    /// SIGINT). Idempotent: running containers carrying this fleet's labels
    /// are adopted, and a converged fleet performs no launches.
    pub async fn up<F>(
        &self,
        options: &UpOptions,
        register_cancel: F,
    ) -> Result<FleetStatus, FleetError>
    where
        F: FnOnce(CancelHandle),
    {
        self.ensure_networks().await?;
        let adopted = self.adopt_running().await?;

        let launcher = Arc::new(RuntimeLauncher::new(
            Arc::clone(&self.runtime),
            self.config.fleet.clone(),
        ));
        let prober = Arc::new(RuntimeProber::new(Arc::clone(&self.runtime)));
        let scheduler = Scheduler::new(Arc::clone(&self.topology), launcher, prober);
        register_cancel(scheduler.cancel_handle());

        let timeout = options.timeout.unwrap_or(self.config.up_timeout);
        let (status, end) = scheduler.run(adopted, timeout).await;

        match end {
            RunEnd::DeadlineExceeded => Err(FleetError::ConvergenceTimeout {
                timeout,
                unsatisfied: status.unsatisfied(),
            }),
            RunEnd::Completed | RunEnd::Cancelled => Ok(status),
        }
    }

    /// Stop and remove every managed container, dependents before their
    /// dependencies. Safe to call on a fleet that is already down.
    pub async fn down(&self) -> Result<Vec<ServiceName>, FleetError> {
        let mut managed = self.managed_containers(true).await?;
        let mut torn_down = Vec::new();

        for service in self.topology.graph.teardown_order() {
            let Some(container) = managed.remove(&service) else {
                continue;
            };
            let stop_timeout = self
                .topology
                .descriptor(&service)
                .and_then(|d| d.stop_timeout)
                .unwrap_or(self.config.stop_timeout);

            if container.state.eq_ignore_ascii_case("running") {
                tracing::info!(service = %service, "stopping");
                self.runtime
                    .stop_container(&container.id, stop_timeout)
                    .await
                    .map_err(|e| FleetError::Runtime(e.to_string()))?;
            }
            self.runtime
                .remove_container(&container.id, false)
                .await
                .map_err(|e| FleetError::Runtime(e.to_string()))?;
            torn_down.push(service);
        }

        // Containers labeled for this fleet but absent from the current
        // topology (renamed or removed services) go last.
        for (service, container) in managed {
            tracing::info!(service = %service, "removing orphaned container");
            if container.state.eq_ignore_ascii_case("running") {
                self.runtime
                    .stop_container(&container.id, self.config.stop_timeout)
                    .await
                    .map_err(|e| FleetError::Runtime(e.to_string()))?;
            }
            self.runtime
                .remove_container(&container.id, false)
                .await
                .map_err(|e| FleetError::Runtime(e.to_string()))?;
            torn_down.push(service);
        }

        Ok(torn_down)
    }

    /// Read-only view of the fleet. Runs a single probe round against
    /// running services that declare one, so health is observed rather than
    /// assumed.
    pub async fn status(&self) -> Result<FleetStatus, FleetError> {
        let managed = self.managed_containers(true).await?;
        let prober = RuntimeProber::new(Arc::clone(&self.runtime));
        let mut services = BTreeMap::new();

        for (name, descriptor) in &self.topology.descriptors {
            let mut state = ServiceRuntimeState::new(descriptor.convergence_target());
            state.phase = NodePhase::Stopped;

            if let Some(container) = managed.get(name) {
                if container.state.eq_ignore_ascii_case("running") {
                    state.container = Some(container.id.clone());
                    if descriptor.probe.is_none() {
                        state.phase = NodePhase::Healthy;
                    } else {
                        let probe_timeout = descriptor
                            .probe
                            .as_ref()
                            .map(|p| p.timeout)
                            .unwrap_or(Duration::from_secs(5));
                        let outcome =
                            tokio::time::timeout(probe_timeout, prober.check(descriptor, &container.id))
                                .await
                                .unwrap_or_else(|_| {
                                    ProbeOutcome::Unreachable("probe timed out".to_string())
                                });
                        state.phase = match &outcome {
                            ProbeOutcome::Healthy => NodePhase::Healthy,
                            _ => NodePhase::Started,
                        };
                        state.last_probe = Some(outcome);
                    }
                }
            }
            services.insert(name.clone(), state);
        }

        let satisfied = services.values().filter(|s| s.satisfied()).count();
        let phase = if satisfied == services.len() {
            FleetPhase::Converged
        } else if satisfied > 0 {
            FleetPhase::Degraded
        } else {
            FleetPhase::Failed
        };

        Ok(FleetStatus { phase, services })
    }

    /// Create any declared network that does not exist yet.
    async fn ensure_networks(&self) -> Result<(), FleetError> {
        for network in self.topology.networks.networks() {
            let physical = physical_network_name(&self.config.fleet, network);
            let exists = self
                .runtime
                .network_exists(&physical)
                .await
                .map_err(|e| FleetError::Runtime(e.to_string()))?;
            if exists {
                continue;
            }
            tracing::info!(network = %physical, "creating network");
            let driver = self
                .config
                .networks
                .get(network.as_str())
                .and_then(|decl| decl.driver.clone());
            let config = NetworkConfig {
                name: physical,
                driver,
                labels: [
                    (LABEL_MANAGED.to_string(), "true".to_string()),
                    (LABEL_FLEET.to_string(), self.config.fleet.clone()),
                ]
                .into(),
            };
            self.runtime
                .create_network(&config)
                .await
                .map_err(|e| FleetError::Runtime(e.to_string()))?;
        }
        Ok(())
    }

    /// Running containers carrying this fleet's labels, keyed by service.
    async fn adopt_running(&self) -> Result<BTreeMap<ServiceName, ContainerId>, FleetError> {
        let managed = self.managed_containers(false).await?;
        let mut adopted = BTreeMap::new();
        for (service, container) in managed {
            if self.topology.descriptor(&service).is_some()
                && container.state.eq_ignore_ascii_case("running")
            {
                adopted.insert(service, container.id);
            }
        }
        Ok(adopted)
    }

    async fn managed_containers(
        &self,
        all: bool,
    ) -> Result<BTreeMap<ServiceName, ContainerSummary>, FleetError> {
        let filters = ContainerFilters {
            labels: [
                (LABEL_MANAGED.to_string(), "true".to_string()),
                (LABEL_FLEET.to_string(), self.config.fleet.clone()),
            ]
            .into(),
            name: None,
            all,
        };
        let summaries = self
            .runtime
            .list_containers(&filters)
            .await
            .map_err(|e| FleetError::Runtime(e.to_string()))?;

        let mut managed = BTreeMap::new();
        for summary in summaries {
            let Some(service) = summary
                .labels
                .get(LABEL_SERVICE)
                .and_then(|raw| ServiceName::new(raw).ok())
            else {
                continue;
            };
            managed.insert(service, summary);
        }
        Ok(managed)
    }
}
