// ABOUTME: Entry point for the cellrig CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;

use cellrig::config::{self, TopologyConfig};
use cellrig::error::{Error, Result};
use cellrig::fleet::{FleetController, UpOptions};
use cellrig::output::Output;
use cellrig::runtime::DockerRuntime;
use cellrig::topology;
use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mut output = Output::new(cli.output.into());

    match run(cli, &mut output).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            output.error(&e.to_string());
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli, output: &mut Output) -> Result<i32> {
    match cli.command {
        Commands::Init { force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, force)?;
            output.success(&format!("wrote {}", config::CONFIG_FILENAME));
            Ok(0)
        }
        Commands::Validate { file } => {
            let config = load_config(file)?;
            let resolved = topology::resolve(&config)?;
            output.success(&format!(
                "topology ok: {} services, {} networks",
                resolved.descriptors.len(),
                resolved.networks.networks().count()
            ));
            Ok(0)
        }
        Commands::Up { file, timeout } => {
            let config = load_config(file)?;
            let controller = connect_controller(config).await?;

            output.start_timer();
            output.progress("bringing fleet up...");

            let status = controller
                .up(&UpOptions { timeout }, |cancel| {
                    tokio::spawn(async move {
                        if tokio::signal::ctrl_c().await.is_ok() {
                            tracing::info!("interrupt received, cancelling bring-up");
                            cancel.cancel();
                        }
                    });
                })
                .await?;

            output.fleet_status(&status);
            if status.is_converged() {
                output.success("fleet converged");
                Ok(0)
            } else {
                let unsatisfied: Vec<&str> = status
                    .services
                    .iter()
                    .filter(|(_, s)| !s.satisfied())
                    .map(|(n, _)| n.as_str())
                    .collect();
                output.error(&format!(
                    "fleet did not converge; unsatisfied: {}",
                    unsatisfied.join(", ")
                ));
                Ok(1)
            }
        }
        Commands::Down { file } => {
            let config = load_config(file)?;
            let controller = connect_controller(config).await?;

            output.start_timer();
            output.progress("tearing fleet down...");
            let torn_down = controller.down().await?;
            output.success(&format!("stopped {} service(s)", torn_down.len()));
            Ok(0)
        }
        Commands::Status { file } => {
            let config = load_config(file)?;
            let controller = connect_controller(config).await?;
            let status = controller.status().await?;
            output.fleet_status(&status);
            Ok(0)
        }
    }
}

fn load_config(file: Option<PathBuf>) -> Result<TopologyConfig> {
    match file {
        Some(path) => TopologyConfig::load(&path),
        None => {
            let cwd = env::current_dir()?;
            TopologyConfig::discover(&cwd)
        }
    }
}

async fn connect_controller(config: TopologyConfig) -> Result<FleetController<DockerRuntime>> {
    let runtime =
        DockerRuntime::connect_local().map_err(|e| Error::RuntimeConnection(e.to_string()))?;
    runtime
        .ping()
        .await
        .map_err(|e| Error::RuntimeConnection(e.to_string()))?;
    FleetController::new(Arc::new(runtime), config).map_err(Error::from)
}
