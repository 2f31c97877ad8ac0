// ABOUTME: Per-service probe supervision task.
// ABOUTME: Polls after a grace period, escalates after consecutive failures.

use super::{ProbeOutcome, ProbeRunner};
use crate::topology::ServiceDescriptor;
use crate::types::{ContainerId, ServiceName};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// State transition reported by a supervisor. Exactly one terminal event is
/// emitted per supervision run.
#[derive(Debug, Clone)]
pub enum ProbeEvent {
    BecameHealthy {
        service: ServiceName,
    },
    Failed {
        service: ServiceName,
        reason: String,
    },
}

/// Spawn the supervision task for one started service.
///
/// The caller is never blocked; the task sleeps through the probe's start
/// period, then polls at the configured interval (plus per-service jitter so
/// a large fleet doesn't poll in lockstep) until the first success or until
/// the consecutive-failure threshold is exhausted.
pub fn supervise<P: ProbeRunner>(
    prober: Arc<P>,
    descriptor: ServiceDescriptor,
    container: ContainerId,
    events: mpsc::UnboundedSender<ProbeEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let Some(probe) = descriptor.probe.clone() else {
            // Nothing to supervise; the scheduler promotes probe-less
            // services on start.
            return;
        };
        let service = descriptor.name.clone();

        if probe.start_period > Duration::ZERO {
            tokio::time::sleep(probe.start_period).await;
        }

        let jitter = jitter_for(&service, probe.interval);
        let mut consecutive_failures: u32 = 0;

        loop {
            let outcome =
                match tokio::time::timeout(probe.timeout, prober.check(&descriptor, &container))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => ProbeOutcome::Unreachable(format!(
                        "probe timed out after {:?}",
                        probe.timeout
                    )),
                };

            match outcome {
                ProbeOutcome::Healthy => {
                    let _ = events.send(ProbeEvent::BecameHealthy { service });
                    return;
                }
                ProbeOutcome::Unhealthy(reason) | ProbeOutcome::Unreachable(reason) => {
                    consecutive_failures += 1;
                    tracing::debug!(
                        service = %service,
                        failures = consecutive_failures,
                        "probe not ready: {}",
                        reason
                    );
                    if consecutive_failures > probe.retries {
                        let _ = events.send(ProbeEvent::Failed { service, reason });
                        return;
                    }
                }
            }

            tokio::time::sleep(probe.interval + jitter).await;
        }
    })
}

/// Deterministic per-service jitter, at most a tenth of the interval.
fn jitter_for(service: &ServiceName, interval: Duration) -> Duration {
    let mut hasher = DefaultHasher::new();
    service.hash(&mut hasher);
    let span_ms = (interval.as_millis() as u64 / 10).max(1);
    Duration::from_millis(hasher.finish() % span_ms)
}
