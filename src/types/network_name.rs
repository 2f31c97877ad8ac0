// ABOUTME: Validated virtual network name.
// ABOUTME: Ensures names are non-empty and contain only valid characters.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkNameError {
    #[error("network name cannot be empty")]
    Empty,

    #[error("invalid character in network name: '{0}'")]
    InvalidChar(char),
}

/// Name of a virtual network segment. Two services can exchange traffic
/// only if their network-name sets intersect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NetworkName(String);

impl NetworkName {
    pub fn new(value: &str) -> Result<Self, NetworkNameError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(NetworkNameError::Empty);
        }

        // Valid characters: alphanumeric, hyphen, underscore, dot
        for c in trimmed.chars() {
            if !c.is_ascii_alphanumeric() && c != '-' && c != '_' && c != '.' {
                return Err(NetworkNameError::InvalidChar(c));
            }
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
