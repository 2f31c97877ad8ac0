// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod id;
mod image_ref;
mod network_name;
mod service_name;

pub use id::{ContainerId, NetworkId};
pub use image_ref::{ImageRef, ParseImageRefError};
pub use network_name::{NetworkName, NetworkNameError};
pub use service_name::{ServiceName, ServiceNameError};
