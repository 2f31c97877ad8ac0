// ABOUTME: Environment binding value types for service declarations.
// ABOUTME: Literals, host env vars, and references to other services.

use serde::Deserialize;

/// A single environment binding in a service declaration.
///
/// Service references (`{ service: store, field: url }`) are resolved during
/// the topology resolution pass, never at runtime, so a launched container
/// only ever sees plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
    FromService {
        service: String,
        field: ServiceField,
    },
}

/// Which piece of a referenced service's identity to substitute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceField {
    /// The service's name, resolvable as a network alias.
    Host,
    /// The service's first declared container port.
    Port,
    /// `http://<host>:<port>`.
    Url,
}
