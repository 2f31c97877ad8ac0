// ABOUTME: Application-wide error types for cellrig.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Topology(#[from] crate::topology::ConfigError),

    #[error(transparent)]
    Fleet(#[from] crate::fleet::FleetError),

    #[error("runtime connection failed: {0}")]
    RuntimeConnection(String),
}

pub type Result<T> = std::result::Result<T, Error>;
