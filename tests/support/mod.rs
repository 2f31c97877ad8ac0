// ABOUTME: Shared test support: in-memory runtime plus scriptable fakes
// ABOUTME: for the launcher and probe seams.

#![allow(dead_code)]

use async_trait::async_trait;
use cellrig::config::TopologyConfig;
use cellrig::probe::{ProbeOutcome, ProbeRunner};
use cellrig::runtime::{
    ContainerConfig, ContainerError, ContainerFilters, ContainerInfo, ContainerOps,
    ContainerState, ContainerSummary, ImageError, ImageOps, NetworkConfig, NetworkError,
    NetworkOps, RegistryAuth,
};
use cellrig::scheduler::{LaunchError, Launcher};
use cellrig::topology::{ResolvedTopology, ServiceDescriptor, resolve};
use cellrig::types::{ContainerId, ImageRef, NetworkId, ServiceName};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub fn name(s: &str) -> ServiceName {
    ServiceName::new(s).unwrap()
}

pub fn resolved(yaml: &str) -> ResolvedTopology {
    let config = TopologyConfig::from_yaml(yaml).unwrap();
    resolve(&config).unwrap()
}

// =============================================================================
// In-memory container runtime
// =============================================================================

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub labels: HashMap<String, String>,
    pub networks: Vec<String>,
    pub running: bool,
}

#[derive(Debug, Default)]
pub struct FakeState {
    next_id: u64,
    pub containers: Vec<FakeContainer>,
    pub networks: Vec<String>,
    pub pulled: Vec<String>,
    /// Ordered operation log: "create <name>", "start <name>", ...
    pub log: Vec<String>,
    /// Scripted result for cmd probes, keyed by service label. Missing
    /// entries succeed.
    pub probe_results: HashMap<String, bool>,
}

/// In-memory runtime implementing all three capability traits.
#[derive(Debug, Default)]
pub struct FakeRuntime {
    pub state: Mutex<FakeState>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn container_named(&self, name: &str) -> Option<FakeContainer> {
        self.state
            .lock()
            .unwrap()
            .containers
            .iter()
            .find(|c| c.name == name)
            .cloned()
    }

    pub fn set_probe_result(&self, service: &str, healthy: bool) {
        self.state
            .lock()
            .unwrap()
            .probe_results
            .insert(service.to_string(), healthy);
    }
}

#[async_trait]
impl ImageOps for FakeRuntime {
    async fn pull_image(
        &self,
        reference: &ImageRef,
        _auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError> {
        let mut state = self.state.lock().unwrap();
        state.pulled.push(reference.to_string());
        state.log.push(format!("pull {reference}"));
        Ok(())
    }

    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError> {
        let state = self.state.lock().unwrap();
        Ok(state.pulled.contains(&reference.to_string()))
    }
}

#[async_trait]
impl ContainerOps for FakeRuntime {
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError> {
        let mut state = self.state.lock().unwrap();
        if state.containers.iter().any(|c| c.name == config.name) {
            return Err(ContainerError::AlreadyExists(config.name.clone()));
        }
        state.next_id += 1;
        let id = ContainerId::new(format!("ctr-{}", state.next_id));
        let mut networks = Vec::new();
        if let Some(primary) = &config.network {
            networks.push(primary.clone());
        }
        state.containers.push(FakeContainer {
            id: id.clone(),
            name: config.name.clone(),
            image: config.image.to_string(),
            labels: config.labels.clone(),
            networks,
            running: false,
        });
        state.log.push(format!("create {}", config.name));
        Ok(id)
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        let mut state = self.state.lock().unwrap();
        let container = state
            .containers
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        container.running = true;
        let entry = format!("start {}", container.name);
        state.log.push(entry);
        Ok(())
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        _timeout: Duration,
    ) -> Result<(), ContainerError> {
        let mut state = self.state.lock().unwrap();
        let container = state
            .containers
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        container.running = false;
        let entry = format!("stop {}", container.name);
        state.log.push(entry);
        Ok(())
    }

    async fn remove_container(&self, id: &ContainerId, _force: bool) -> Result<(), ContainerError> {
        let mut state = self.state.lock().unwrap();
        let position = state
            .containers
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        let removed = state.containers.remove(position);
        state.log.push(format!("remove {}", removed.name));
        Ok(())
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let state = self.state.lock().unwrap();
        let container = state
            .containers
            .iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        Ok(ContainerInfo {
            id: container.id.clone(),
            name: container.name.clone(),
            image: container.image.clone(),
            state: if container.running {
                ContainerState::Running
            } else {
                ContainerState::Exited
            },
            labels: container.labels.clone(),
        })
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .containers
            .iter()
            .filter(|c| filters.all || c.running)
            .filter(|c| {
                filters
                    .labels
                    .iter()
                    .all(|(k, v)| c.labels.get(k) == Some(v))
            })
            .filter(|c| {
                filters
                    .name
                    .as_ref()
                    .is_none_or(|needle| c.name.contains(needle))
            })
            .map(|c| ContainerSummary {
                id: c.id.clone(),
                name: c.name.clone(),
                image: c.image.clone(),
                state: if c.running { "running" } else { "exited" }.to_string(),
                labels: c.labels.clone(),
            })
            .collect())
    }

    async fn run_probe(&self, id: &ContainerId, _cmd: &[String]) -> Result<bool, ContainerError> {
        let state = self.state.lock().unwrap();
        let container = state
            .containers
            .iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if !container.running {
            return Err(ContainerError::NotRunning(id.to_string()));
        }
        let service = container
            .labels
            .get("cellrig.service")
            .cloned()
            .unwrap_or_default();
        Ok(*state.probe_results.get(&service).unwrap_or(&true))
    }
}

#[async_trait]
impl NetworkOps for FakeRuntime {
    async fn create_network(&self, config: &NetworkConfig) -> Result<NetworkId, NetworkError> {
        let mut state = self.state.lock().unwrap();
        if state.networks.contains(&config.name) {
            return Err(NetworkError::AlreadyExists(config.name.clone()));
        }
        state.networks.push(config.name.clone());
        state.log.push(format!("network {}", config.name));
        Ok(NetworkId::new(config.name.clone()))
    }

    async fn network_exists(&self, name: &str) -> Result<bool, NetworkError> {
        Ok(self.state.lock().unwrap().networks.iter().any(|n| n == name))
    }

    async fn connect_to_network(
        &self,
        container: &ContainerId,
        network: &NetworkId,
        _aliases: &[ServiceName],
    ) -> Result<(), NetworkError> {
        let mut state = self.state.lock().unwrap();
        let found = state
            .containers
            .iter_mut()
            .find(|c| &c.id == container)
            .ok_or_else(|| NetworkError::ContainerNotFound(container.to_string()))?;
        found.networks.push(network.to_string());
        Ok(())
    }
}

// =============================================================================
// Scriptable launcher and prober for scheduler tests
// =============================================================================

/// Launcher that records launch order and fails on demand.
#[derive(Debug, Default)]
pub struct FakeLauncher {
    inner: Mutex<FakeLauncherState>,
}

#[derive(Debug, Default)]
struct FakeLauncherState {
    next_id: u64,
    attempts: Vec<ServiceName>,
    /// Remaining failures per service before a launch succeeds.
    /// `u32::MAX` never succeeds.
    failures: HashMap<ServiceName, u32>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_times(&self, service: &ServiceName, times: u32) {
        self.inner
            .lock()
            .unwrap()
            .failures
            .insert(service.clone(), times);
    }

    pub fn always_fail(&self, service: &ServiceName) {
        self.fail_times(service, u32::MAX);
    }

    /// Every launch attempt, in the order it was issued.
    pub fn attempts(&self) -> Vec<ServiceName> {
        self.inner.lock().unwrap().attempts.clone()
    }

    pub fn attempts_for(&self, service: &ServiceName) -> usize {
        self.attempts().iter().filter(|s| *s == service).count()
    }

    pub fn position_of(&self, service: &ServiceName) -> Option<usize> {
        self.attempts().iter().position(|s| s == service)
    }
}

#[async_trait]
impl Launcher for FakeLauncher {
    async fn launch(&self, descriptor: &ServiceDescriptor) -> Result<ContainerId, LaunchError> {
        // Yield once so sibling launches interleave like real I/O would.
        tokio::task::yield_now().await;
        let mut inner = self.inner.lock().unwrap();
        inner.attempts.push(descriptor.name.clone());
        match inner.failures.get_mut(&descriptor.name) {
            Some(remaining) if *remaining == u32::MAX => Err(LaunchError::Container {
                message: "scripted failure".to_string(),
            }),
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(LaunchError::Container {
                    message: "scripted failure".to_string(),
                })
            }
            _ => {
                inner.next_id += 1;
                Ok(ContainerId::new(format!(
                    "{}-{}",
                    descriptor.name, inner.next_id
                )))
            }
        }
    }
}

/// How a fake probe behaves for one service.
#[derive(Debug, Clone, Copy)]
pub enum ProbePlan {
    AlwaysHealthy,
    AlwaysUnhealthy,
    /// Unhealthy for the first `n` polls, healthy afterwards.
    HealthyAfter(u32),
}

/// Prober that answers from scripted plans. Services without a plan are
/// healthy on the first poll.
#[derive(Debug, Default)]
pub struct FakeProber {
    inner: Mutex<FakeProberState>,
}

#[derive(Debug, Default)]
struct FakeProberState {
    plans: HashMap<ServiceName, ProbePlan>,
    polls: HashMap<ServiceName, u32>,
}

impl FakeProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(&self, service: &ServiceName, plan: ProbePlan) {
        self.inner.lock().unwrap().plans.insert(service.clone(), plan);
    }

    pub fn polls_for(&self, service: &ServiceName) -> u32 {
        *self
            .inner
            .lock()
            .unwrap()
            .polls
            .get(service)
            .unwrap_or(&0)
    }
}

#[async_trait]
impl ProbeRunner for FakeProber {
    async fn check(
        &self,
        descriptor: &ServiceDescriptor,
        _container: &ContainerId,
    ) -> ProbeOutcome {
        let mut inner = self.inner.lock().unwrap();
        let polls = inner.polls.entry(descriptor.name.clone()).or_insert(0);
        *polls += 1;
        let seen = *polls;
        match inner.plans.get(&descriptor.name) {
            None | Some(ProbePlan::AlwaysHealthy) => ProbeOutcome::Healthy,
            Some(ProbePlan::AlwaysUnhealthy) => {
                ProbeOutcome::Unhealthy("scripted unhealthy".to_string())
            }
            Some(ProbePlan::HealthyAfter(n)) if seen > *n => ProbeOutcome::Healthy,
            Some(ProbePlan::HealthyAfter(_)) => {
                ProbeOutcome::Unhealthy("scripted warm-up".to_string())
            }
        }
    }
}
