// ABOUTME: Event-driven startup scheduler.
// ABOUTME: Single consumer loop; launch and probe tasks report over channels.

mod events;
mod launcher;
mod state;

pub use events::LaunchEvent;
pub use launcher::{LaunchError, Launcher};
pub use state::{FleetPhase, FleetStatus, NodePhase, ServiceRuntimeState};

use crate::probe::{ProbeEvent, ProbeRunner, supervise};
use crate::topology::ResolvedTopology;
use crate::types::{ContainerId, ServiceName};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Why a run returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// Every node reached a terminal phase.
    Completed,
    /// The global deadline fired with work still outstanding.
    DeadlineExceeded,
    /// Cancel was requested; in-flight launches finished, nothing new
    /// started.
    Cancelled,
}

/// Cooperative cancel trigger. Honored at phase boundaries only: a launch
/// already in flight completes its transition.
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// The orchestration core. Owns all node state; everything else communicates
/// with it through events.
pub struct Scheduler<L, P> {
    topology: Arc<ResolvedTopology>,
    launcher: Arc<L>,
    prober: Arc<P>,
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
    status_tx: watch::Sender<FleetStatus>,
    status_rx: watch::Receiver<FleetStatus>,
}

impl<L: Launcher, P: ProbeRunner> Scheduler<L, P> {
    pub fn new(topology: Arc<ResolvedTopology>, launcher: Arc<L>, prober: Arc<P>) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let initial = FleetStatus {
            phase: FleetPhase::Converging,
            services: topology
                .descriptors
                .iter()
                .map(|(name, desc)| {
                    (
                        name.clone(),
                        ServiceRuntimeState::new(desc.convergence_target()),
                    )
                })
                .collect(),
        };
        let (status_tx, status_rx) = watch::channel(initial);
        Self {
            topology,
            launcher,
            prober,
            cancel_tx: Arc::new(cancel_tx),
            cancel_rx,
            status_tx,
            status_rx,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.cancel_tx),
        }
    }

    /// Intermediate snapshots, updated after every state transition.
    pub fn status_watch(&self) -> watch::Receiver<FleetStatus> {
        self.status_rx.clone()
    }

    /// Drive the fleet toward convergence.
    ///
    /// `adopted` maps services to containers that are already running and
    /// should not be relaunched; probed adoptees re-enter at `Started` and
    /// must prove readiness again.
    pub async fn run(
        &self,
        adopted: BTreeMap<ServiceName, ContainerId>,
        timeout: Duration,
    ) -> (FleetStatus, RunEnd) {
        let (launch_tx, mut launch_rx) = mpsc::unbounded_channel::<LaunchEvent>();
        let (probe_tx, mut probe_rx) = mpsc::unbounded_channel::<ProbeEvent>();

        let mut nodes: BTreeMap<ServiceName, ServiceRuntimeState> = self
            .topology
            .descriptors
            .iter()
            .map(|(name, desc)| {
                (
                    name.clone(),
                    ServiceRuntimeState::new(desc.convergence_target()),
                )
            })
            .collect();

        let mut supervisors: Vec<JoinHandle<()>> = Vec::new();
        let mut launches_in_flight: usize = 0;
        let mut probes_in_flight: usize = 0;

        for (name, container) in adopted {
            let Some(desc) = self.topology.descriptor(&name) else {
                continue;
            };
            let node = nodes.get_mut(&name).expect("node exists for descriptor");
            node.container = Some(container.clone());
            node.started_at = Some(Utc::now());
            if desc.probe.is_some() {
                node.phase = NodePhase::Started;
                supervisors.push(supervise(
                    Arc::clone(&self.prober),
                    desc.clone(),
                    container,
                    probe_tx.clone(),
                ));
                probes_in_flight += 1;
            } else {
                node.phase = NodePhase::Healthy;
            }
            tracing::debug!(service = %name, "adopted running container");
        }

        self.promote_eligible(&mut nodes, &launch_tx, &mut launches_in_flight);
        self.publish(&nodes);

        let deadline = tokio::time::Instant::now() + timeout;
        let mut cancel = self.cancel_rx.clone();
        let mut cancelled = *cancel.borrow();
        let mut end = RunEnd::Completed;

        loop {
            // Once cancelled, only in-flight launches are waited out; probe
            // supervisors are abandoned below.
            let outstanding = launches_in_flight + if cancelled { 0 } else { probes_in_flight };
            if outstanding == 0 {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    end = RunEnd::DeadlineExceeded;
                    tracing::warn!("convergence deadline exceeded");
                    break;
                }
                changed = cancel.changed() => {
                    if changed.is_ok() && *cancel.borrow() && !cancelled {
                        cancelled = true;
                        end = RunEnd::Cancelled;
                        tracing::info!("cancel requested, no further launches");
                    }
                }
                Some(event) = launch_rx.recv() => {
                    launches_in_flight -= 1;
                    match event {
                        LaunchEvent::Launched { service, container } => {
                            let desc = self
                                .topology
                                .descriptor(&service)
                                .expect("launched service is in the topology")
                                .clone();
                            let node = nodes.get_mut(&service).expect("node exists");
                            node.container = Some(container.clone());
                            node.started_at = Some(Utc::now());
                            if desc.probe.is_some() {
                                node.phase = NodePhase::Started;
                                supervisors.push(supervise(
                                    Arc::clone(&self.prober),
                                    desc,
                                    container,
                                    probe_tx.clone(),
                                ));
                                probes_in_flight += 1;
                            } else {
                                // No probe: running is as healthy as observable.
                                node.phase = NodePhase::Healthy;
                            }
                            tracing::info!(service = %service, "started");
                            if !cancelled {
                                self.promote_eligible(&mut nodes, &launch_tx, &mut launches_in_flight);
                            }
                        }
                        LaunchEvent::LaunchFailed { service, reason } => {
                            tracing::error!(service = %service, "launch failed: {}", reason);
                            nodes.get_mut(&service).expect("node exists").phase =
                                NodePhase::Failed { reason };
                            block_dependents(&self.topology, &mut nodes, &service);
                        }
                    }
                }
                Some(event) = probe_rx.recv() => {
                    probes_in_flight -= 1;
                    match event {
                        ProbeEvent::BecameHealthy { service } => {
                            tracing::info!(service = %service, "healthy");
                            let node = nodes.get_mut(&service).expect("node exists");
                            node.phase = NodePhase::Healthy;
                            node.last_probe = Some(crate::probe::ProbeOutcome::Healthy);
                            if !cancelled {
                                self.promote_eligible(&mut nodes, &launch_tx, &mut launches_in_flight);
                            }
                        }
                        ProbeEvent::Failed { service, reason } => {
                            tracing::error!(service = %service, "probe escalated: {}", reason);
                            let node = nodes.get_mut(&service).expect("node exists");
                            node.last_probe =
                                Some(crate::probe::ProbeOutcome::Unhealthy(reason.clone()));
                            node.phase = NodePhase::Failed {
                                reason: format!("readiness probe failed: {reason}"),
                            };
                            block_dependents(&self.topology, &mut nodes, &service);
                        }
                    }
                }
            }

            self.publish(&nodes);
        }

        for task in supervisors {
            task.abort();
        }

        let satisfied = nodes.values().filter(|n| n.satisfied()).count();
        let phase = if end == RunEnd::DeadlineExceeded {
            FleetPhase::Failed
        } else if satisfied == nodes.len() {
            FleetPhase::Converged
        } else if satisfied > 0 {
            FleetPhase::Degraded
        } else {
            FleetPhase::Failed
        };

        let status = FleetStatus {
            phase,
            services: nodes,
        };
        let _ = self.status_tx.send(status.clone());
        (status, end)
    }

    /// Launch every pending node whose dependencies are all satisfied.
    /// Siblings of the frontier launch concurrently, in no defined order.
    fn promote_eligible(
        &self,
        nodes: &mut BTreeMap<ServiceName, ServiceRuntimeState>,
        launch_tx: &mpsc::UnboundedSender<LaunchEvent>,
        launches_in_flight: &mut usize,
    ) {
        let eligible: Vec<ServiceName> = nodes
            .iter()
            .filter(|(_, state)| {
                matches!(state.phase, NodePhase::Pending | NodePhase::Eligible)
            })
            .filter(|(name, _)| {
                self.topology
                    .graph
                    .dependencies_of(name)
                    .iter()
                    .all(|edge| nodes[&edge.to].phase.satisfies(edge.required))
            })
            .map(|(name, _)| name.clone())
            .collect();

        for name in eligible {
            let desc = self
                .topology
                .descriptor(&name)
                .expect("eligible service is in the topology")
                .clone();
            nodes.get_mut(&name).expect("node exists").phase = NodePhase::Starting;
            *launches_in_flight += 1;
            tracing::debug!(service = %name, "launching");

            let launcher = Arc::clone(&self.launcher);
            let tx = launch_tx.clone();
            tokio::spawn(async move {
                let mut attempt: u32 = 0;
                loop {
                    match launcher.launch(&desc).await {
                        Ok(container) => {
                            let _ = tx.send(LaunchEvent::Launched {
                                service: desc.name.clone(),
                                container,
                            });
                            return;
                        }
                        Err(e) if attempt < desc.launch_retries => {
                            attempt += 1;
                            tracing::warn!(
                                service = %desc.name,
                                attempt,
                                "launch attempt failed, retrying: {}",
                                e
                            );
                            tokio::time::sleep(Duration::from_secs(1)).await;
                        }
                        Err(e) => {
                            let _ = tx.send(LaunchEvent::LaunchFailed {
                                service: desc.name.clone(),
                                reason: e.to_string(),
                            });
                            return;
                        }
                    }
                }
            });
        }
    }

    fn publish(&self, nodes: &BTreeMap<ServiceName, ServiceRuntimeState>) {
        let _ = self.status_tx.send(FleetStatus {
            phase: FleetPhase::Converging,
            services: nodes.clone(),
        });
    }
}

/// Mark every transitive dependent that has not yet launched as blocked on
/// the failed root. Nodes already past launch keep their phase.
fn block_dependents(
    topology: &ResolvedTopology,
    nodes: &mut BTreeMap<ServiceName, ServiceRuntimeState>,
    failed: &ServiceName,
) {
    for dependent in topology.graph.transitive_dependents(failed) {
        let node = nodes.get_mut(&dependent).expect("dependent is in the topology");
        if matches!(node.phase, NodePhase::Pending | NodePhase::Eligible) {
            tracing::warn!(service = %dependent, blocked_on = %failed, "blocked");
            node.phase = NodePhase::Blocked {
                on: failed.clone(),
            };
        }
    }
}
