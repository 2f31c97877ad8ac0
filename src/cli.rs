// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use cellrig::output::OutputMode;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "cellrig")]
#[command(about = "Topology-driven bring-up for containerized work cells")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output mode
    #[arg(long, global = true, value_enum, default_value_t = OutputArg::Normal)]
    pub output: OutputArg,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputArg {
    Normal,
    Quiet,
    Json,
}

impl From<OutputArg> for OutputMode {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Normal => OutputMode::Normal,
            OutputArg::Quiet => OutputMode::Quiet,
            OutputArg::Json => OutputMode::Json,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a template cellrig.yml configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Validate the topology without touching the container runtime
    Validate {
        /// Configuration file (defaults to discovery in the working directory)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Bring the fleet up and wait for convergence
    Up {
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Convergence deadline, e.g. "90s" or "5m" (overrides the config)
        #[arg(long, value_parser = humantime::parse_duration)]
        timeout: Option<Duration>,
    },

    /// Stop and remove the fleet in reverse dependency order
    Down {
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show the observed state of the fleet
    Status {
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
