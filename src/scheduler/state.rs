// ABOUTME: Node and fleet state as observed by the scheduler loop.
// ABOUTME: Snapshots are plain data, serializable for the json output mode.

use crate::config::RequiredState;
use crate::probe::ProbeOutcome;
use crate::types::{ContainerId, ServiceName};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Lifecycle phase of a single node. Written only by the scheduler loop;
/// launch and probe tasks report transitions as events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodePhase {
    /// Waiting on at least one dependency.
    Pending,
    /// Every dependency satisfied; launch not yet issued.
    Eligible,
    /// Launch in flight.
    Starting,
    /// Container running; readiness not yet established.
    Started,
    /// Readiness established (first probe success, or no probe declared).
    Healthy,
    /// Launch exhausted its retries, or the probe escalated.
    Failed { reason: String },
    /// A transitive dependency failed before this node could launch.
    Blocked { on: ServiceName },
    /// Not running (reported by `status` and after `down`).
    Stopped,
}

impl NodePhase {
    /// Whether this phase satisfies a dependency edge requiring `required`.
    /// Healthy satisfies a started requirement, never the reverse.
    pub fn satisfies(&self, required: RequiredState) -> bool {
        match required {
            RequiredState::Started => matches!(self, NodePhase::Started | NodePhase::Healthy),
            RequiredState::Healthy => matches!(self, NodePhase::Healthy),
        }
    }
}

/// Scheduler-owned view of one service.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceRuntimeState {
    pub phase: NodePhase,
    /// The phase this node must reach for the fleet to converge.
    pub target: RequiredState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_probe: Option<ProbeOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl ServiceRuntimeState {
    pub fn new(target: RequiredState) -> Self {
        Self {
            phase: NodePhase::Pending,
            target,
            container: None,
            last_probe: None,
            started_at: None,
        }
    }

    /// Whether the node has reached its own convergence target.
    pub fn satisfied(&self) -> bool {
        self.phase.satisfies(self.target)
    }
}

/// Fleet-level phase. `Converging` only appears in intermediate snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FleetPhase {
    Converging,
    /// Every node reached its target.
    Converged,
    /// Some nodes reached their target, the rest are terminal.
    Degraded,
    /// No node reached its target, or the global deadline was hit.
    Failed,
}

/// A point-in-time view of the whole fleet.
#[derive(Debug, Clone, Serialize)]
pub struct FleetStatus {
    pub phase: FleetPhase,
    pub services: BTreeMap<ServiceName, ServiceRuntimeState>,
}

impl FleetStatus {
    pub fn is_converged(&self) -> bool {
        self.phase == FleetPhase::Converged
    }

    /// Nodes that have not reached their convergence target.
    pub fn unsatisfied(&self) -> Vec<ServiceName> {
        self.services
            .iter()
            .filter(|(_, state)| !state.satisfied())
            .map(|(name, _)| name.clone())
            .collect()
    }
}
