// ABOUTME: Fleet-level error taxonomy.

use crate::topology::ConfigError;
use crate::types::ServiceName;
use std::time::Duration;
use thiserror::Error;

/// Errors the fleet controller can return. Node-level launch and probe
/// failures are not errors here; they surface per node in `FleetStatus`.
#[derive(Debug, Error)]
pub enum FleetError {
    /// Fatal before anything launches; the fleet never partially starts.
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(
        "fleet did not converge within {timeout:?}; unsatisfied: {}",
        format_names(unsatisfied)
    )]
    ConvergenceTimeout {
        timeout: Duration,
        unsatisfied: Vec<ServiceName>,
    },

    #[error("runtime error: {0}")]
    Runtime(String),
}

fn format_names(names: &[ServiceName]) -> String {
    names
        .iter()
        .map(ServiceName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
