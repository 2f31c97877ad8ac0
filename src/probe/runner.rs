// ABOUTME: Probe runner backed by the container runtime and HTTP client.
// ABOUTME: Cmd probes exec inside the container; HTTP probes hit a published port.

use super::http::http_probe;
use super::{ProbeOutcome, ProbeRunner};
use crate::config::ProbeCheck;
use crate::runtime::ContainerOps;
use crate::topology::ServiceDescriptor;
use crate::types::ContainerId;
use async_trait::async_trait;
use std::sync::Arc;

/// The production probe runner.
///
/// HTTP probes are issued from the controller host, so the probed container
/// port must be published to a host port.
pub struct RuntimeProber<R> {
    runtime: Arc<R>,
}

impl<R> RuntimeProber<R> {
    pub fn new(runtime: Arc<R>) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl<R: ContainerOps + 'static> ProbeRunner for RuntimeProber<R> {
    async fn check(
        &self,
        descriptor: &ServiceDescriptor,
        container: &ContainerId,
    ) -> ProbeOutcome {
        let Some(probe) = &descriptor.probe else {
            // Supervisors are only spawned for services that declare probes.
            return ProbeOutcome::Healthy;
        };

        match &probe.check {
            ProbeCheck::Cmd(cmd) => {
                let argv = vec!["sh".to_string(), "-c".to_string(), cmd.clone()];
                match self.runtime.run_probe(container, &argv).await {
                    Ok(true) => ProbeOutcome::Healthy,
                    Ok(false) => ProbeOutcome::Unhealthy("probe command exited non-zero".into()),
                    Err(e) => ProbeOutcome::Unreachable(e.to_string()),
                }
            }
            ProbeCheck::Http { path, port } => {
                let host_port = descriptor
                    .ports
                    .iter()
                    .find(|p| p.container == *port)
                    .and_then(|p| p.host);
                match host_port {
                    Some(host_port) => http_probe("127.0.0.1", host_port, path).await,
                    None => ProbeOutcome::Unreachable(format!(
                        "probe port {port} is not published to the host"
                    )),
                }
            }
        }
    }
}
