// ABOUTME: Container runtime access layer.
// ABOUTME: Capability traits plus the bollard-backed local implementation.

mod docker;
mod error;
mod traits;

pub use docker::DockerRuntime;
pub use error::{RuntimeError, RuntimeErrorKind};
pub use traits::*;
