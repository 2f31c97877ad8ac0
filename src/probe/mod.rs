// ABOUTME: Readiness probe supervision.
// ABOUTME: One concurrent task per started service, reporting transitions as events.

mod http;
mod runner;
mod supervisor;

pub use http::http_probe;
pub use runner::RuntimeProber;
pub use supervisor::{ProbeEvent, supervise};

use async_trait::async_trait;
use serde::Serialize;

use crate::topology::ServiceDescriptor;
use crate::types::ContainerId;

/// Outcome of a single poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The service reported ready.
    Healthy,
    /// The probe answered, but not ready.
    Unhealthy(String),
    /// The probe could not be reached at all. Counts against the same
    /// consecutive-failure threshold as an unhealthy answer.
    Unreachable(String),
}

/// Executes one readiness check against a running service.
///
/// Implementations must not block; the supervisor owns scheduling, timeouts,
/// and escalation.
#[async_trait]
pub trait ProbeRunner: Send + Sync + 'static {
    async fn check(&self, descriptor: &ServiceDescriptor, container: &ContainerId)
    -> ProbeOutcome;
}
