// ABOUTME: Events reported by launch tasks to the scheduler loop.

use crate::types::{ContainerId, ServiceName};

/// Terminal outcome of one launch task. Exactly one event per task.
#[derive(Debug, Clone)]
pub enum LaunchEvent {
    Launched {
        service: ServiceName,
        container: ContainerId,
    },
    /// The retry budget is already spent when this arrives.
    LaunchFailed {
        service: ServiceName,
        reason: String,
    },
}
