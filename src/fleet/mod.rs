// ABOUTME: Fleet controller facade: up, down, status.
// ABOUTME: Ownership of runtime resources is marked with cellrig labels.

mod controller;
mod error;
mod launcher;

pub use controller::{FleetController, UpOptions};
pub use error::FleetError;
pub use launcher::RuntimeLauncher;

use crate::types::{NetworkName, ServiceName};

/// Marks a container or network as owned by cellrig.
pub const LABEL_MANAGED: &str = "cellrig.managed";
/// The logical service a container implements.
pub const LABEL_SERVICE: &str = "cellrig.service";
/// The fleet a resource belongs to.
pub const LABEL_FLEET: &str = "cellrig.fleet";

/// Physical container name for a service.
pub fn container_name(fleet: &str, service: &ServiceName) -> String {
    format!("{fleet}-{service}")
}

/// Physical network name for a declared virtual network. Prefixed with the
/// fleet name so two fleets on one host never share segments by accident.
pub fn physical_network_name(fleet: &str, network: &NetworkName) -> String {
    format!("{fleet}-{network}")
}
