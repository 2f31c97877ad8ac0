// ABOUTME: Integration tests for the fleet controller against the in-memory runtime.
// ABOUTME: Covers up/down/status, labels, adoption, and teardown ordering.

mod support;

use cellrig::config::TopologyConfig;
use cellrig::fleet::{FleetController, FleetError, UpOptions};
use cellrig::scheduler::{FleetPhase, NodePhase};
use std::sync::Arc;
use support::{FakeRuntime, name};

const CELL: &str = r#"
fleet: cell
networks:
  net: {}
services:
  store:
    image: store:1.0
    networks: [net]
  server:
    image: server:1.0
    networks: [net]
    depends_on: [store]
  ui:
    image: ui:1.0
    networks: [net]
    depends_on: [server]
"#;

fn controller(yaml: &str, runtime: Arc<FakeRuntime>) -> FleetController<FakeRuntime> {
    let config = TopologyConfig::from_yaml(yaml).unwrap();
    FleetController::new(runtime, config).unwrap()
}

async fn up(controller: &FleetController<FakeRuntime>) -> cellrig::scheduler::FleetStatus {
    controller
        .up(&UpOptions::default(), |_cancel| {})
        .await
        .unwrap()
}

mod bring_up {
    use super::*;

    #[tokio::test]
    async fn up_creates_networks_and_labeled_containers() {
        let runtime = Arc::new(FakeRuntime::new());
        let controller = controller(CELL, Arc::clone(&runtime));

        let status = up(&controller).await;

        assert_eq!(status.phase, FleetPhase::Converged);
        let state = runtime.state.lock().unwrap();
        assert!(state.networks.contains(&"cell-net".to_string()));
        assert_eq!(state.containers.len(), 3);
        for container in &state.containers {
            assert!(container.running);
            assert_eq!(container.labels["cellrig.managed"], "true");
            assert_eq!(container.labels["cellrig.fleet"], "cell");
            assert!(container.labels.contains_key("cellrig.service"));
        }
    }

    #[tokio::test]
    async fn container_names_carry_the_fleet_prefix() {
        let runtime = Arc::new(FakeRuntime::new());
        let controller = controller(CELL, Arc::clone(&runtime));

        up(&controller).await;

        assert!(runtime.container_named("cell-store").is_some());
        assert!(runtime.container_named("cell-server").is_some());
        assert!(runtime.container_named("cell-ui").is_some());
    }

    #[tokio::test]
    async fn images_are_pulled_before_launch() {
        let runtime = Arc::new(FakeRuntime::new());
        let controller = controller(CELL, Arc::clone(&runtime));

        up(&controller).await;

        let log = runtime.log();
        let pull = log.iter().position(|e| e == "pull store:1.0").unwrap();
        let create = log.iter().position(|e| e == "create cell-store").unwrap();
        assert!(pull < create);
    }

    #[tokio::test]
    async fn configuration_errors_abort_before_any_launch() {
        let cyclic = r#"
networks:
  net: {}
services:
  a:
    image: a:1.0
    networks: [net]
    depends_on: [b]
  b:
    image: b:1.0
    networks: [net]
    depends_on: [a]
"#;
        let runtime = Arc::new(FakeRuntime::new());
        let config = TopologyConfig::from_yaml(cyclic).unwrap();
        let err = FleetController::new(Arc::clone(&runtime), config).unwrap_err();

        assert!(matches!(err, FleetError::Config(_)));
        assert!(runtime.log().is_empty(), "nothing may touch the runtime");
    }

    #[tokio::test]
    async fn cmd_probed_fleet_converges_when_probes_pass() {
        let yaml = r#"
fleet: cell
networks:
  net: {}
services:
  store:
    image: store:1.0
    networks: [net]
    probe:
      cmd: "store-ok"
      interval: 50ms
      timeout: 1s
      retries: 2
      start_period: 0s
"#;
        let runtime = Arc::new(FakeRuntime::new());
        let controller = controller(yaml, Arc::clone(&runtime));

        let status = up(&controller).await;

        assert_eq!(status.phase, FleetPhase::Converged);
        assert_eq!(status.services[&name("store")].phase, NodePhase::Healthy);
    }
}

mod idempotence {
    use super::*;

    #[tokio::test]
    async fn second_up_adopts_and_launches_nothing() {
        let runtime = Arc::new(FakeRuntime::new());
        let controller = controller(CELL, Arc::clone(&runtime));

        up(&controller).await;
        let creates_before = runtime
            .log()
            .iter()
            .filter(|e| e.starts_with("create"))
            .count();

        let status = up(&controller).await;

        assert_eq!(status.phase, FleetPhase::Converged);
        let creates_after = runtime
            .log()
            .iter()
            .filter(|e| e.starts_with("create"))
            .count();
        assert_eq!(creates_before, creates_after);
    }

    #[tokio::test]
    async fn up_replaces_a_stopped_leftover_container() {
        let runtime = Arc::new(FakeRuntime::new());
        let controller = controller(CELL, Arc::clone(&runtime));

        up(&controller).await;
        // Stop one container behind the controller's back.
        {
            let mut state = runtime.state.lock().unwrap();
            let container = state
                .containers
                .iter_mut()
                .find(|c| c.name == "cell-server")
                .unwrap();
            container.running = false;
        }

        let status = up(&controller).await;

        assert_eq!(status.phase, FleetPhase::Converged);
        let server = runtime.container_named("cell-server").unwrap();
        assert!(server.running);
    }
}

mod teardown {
    use super::*;

    #[tokio::test]
    async fn down_stops_dependents_before_dependencies() {
        let runtime = Arc::new(FakeRuntime::new());
        let controller = controller(CELL, Arc::clone(&runtime));

        up(&controller).await;
        let torn_down = controller.down().await.unwrap();

        assert_eq!(torn_down.len(), 3);
        let log = runtime.log();
        let stop = |n: &str| log.iter().position(|e| e == &format!("stop {n}")).unwrap();
        assert!(stop("cell-ui") < stop("cell-server"));
        assert!(stop("cell-server") < stop("cell-store"));
        assert!(runtime.state.lock().unwrap().containers.is_empty());
    }

    #[tokio::test]
    async fn down_twice_is_a_no_op() {
        let runtime = Arc::new(FakeRuntime::new());
        let controller = controller(CELL, Arc::clone(&runtime));

        up(&controller).await;
        controller.down().await.unwrap();
        let second = controller.down().await.unwrap();

        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn down_on_a_never_started_fleet_is_safe() {
        let runtime = Arc::new(FakeRuntime::new());
        let controller = controller(CELL, Arc::clone(&runtime));

        let torn_down = controller.down().await.unwrap();
        assert!(torn_down.is_empty());
    }
}

mod observation {
    use super::*;

    #[tokio::test]
    async fn status_of_a_running_fleet_is_converged() {
        let runtime = Arc::new(FakeRuntime::new());
        let controller = controller(CELL, Arc::clone(&runtime));

        up(&controller).await;
        let status = controller.status().await.unwrap();

        assert_eq!(status.phase, FleetPhase::Converged);
        for state in status.services.values() {
            assert_eq!(state.phase, NodePhase::Healthy);
        }
    }

    #[tokio::test]
    async fn status_of_a_stopped_fleet_reports_stopped_nodes() {
        let runtime = Arc::new(FakeRuntime::new());
        let controller = controller(CELL, Arc::clone(&runtime));

        let status = controller.status().await.unwrap();

        assert_eq!(status.phase, FleetPhase::Failed);
        for state in status.services.values() {
            assert_eq!(state.phase, NodePhase::Stopped);
        }
    }

    #[tokio::test]
    async fn status_reports_a_partially_lost_fleet_as_degraded() {
        let runtime = Arc::new(FakeRuntime::new());
        let controller = controller(CELL, Arc::clone(&runtime));

        up(&controller).await;
        {
            let mut state = runtime.state.lock().unwrap();
            let container = state
                .containers
                .iter_mut()
                .find(|c| c.name == "cell-ui")
                .unwrap();
            container.running = false;
        }

        let status = controller.status().await.unwrap();

        assert_eq!(status.phase, FleetPhase::Degraded);
        assert_eq!(status.services[&name("ui")].phase, NodePhase::Stopped);
        assert_eq!(status.services[&name("store")].phase, NodePhase::Healthy);
    }
}
