// ABOUTME: Runtime error types with SNAFU pattern.
// ABOUTME: Unifies connection and availability errors for programmatic handling.

use snafu::Snafu;

/// Unified runtime error for connection-level failures.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RuntimeError {
    #[snafu(display("failed to connect to container runtime: {message}"))]
    Connection { message: String },

    #[snafu(display("container runtime unreachable: {message}"))]
    Unreachable { message: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// Failed to connect to the runtime socket.
    ConnectionFailed,
    /// Connected but the runtime does not answer.
    Unreachable,
}

impl RuntimeError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> RuntimeErrorKind {
        match self {
            RuntimeError::Connection { .. } => RuntimeErrorKind::ConnectionFailed,
            RuntimeError::Unreachable { .. } => RuntimeErrorKind::Unreachable,
        }
    }
}
