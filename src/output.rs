// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use crate::scheduler::{FleetStatus, NodePhase};
use serde::Serialize;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                println!("{message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "success",
                    message,
                    duration_secs: if self.start_time.is_some() {
                        Some(self.elapsed_secs())
                    } else {
                        None
                    },
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    println!("{json}");
                }
            }
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                    duration_secs: if self.start_time.is_some() {
                        Some(self.elapsed_secs())
                    } else {
                        None
                    },
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Print a full fleet status: one line per service in normal mode, the
    /// raw structure as one JSON document in json mode.
    pub fn fleet_status(&self, status: &FleetStatus) {
        match self.mode {
            OutputMode::Normal => {
                println!("fleet: {}", phase_label(status));
                for (name, state) in &status.services {
                    println!("  {:<24} {}", name.as_str(), node_label(&state.phase));
                }
            }
            OutputMode::Quiet => {
                println!("{}", phase_label(status));
            }
            OutputMode::Json => {
                if let Ok(json) = serde_json::to_string(status) {
                    println!("{json}");
                }
            }
        }
    }
}

fn phase_label(status: &FleetStatus) -> &'static str {
    use crate::scheduler::FleetPhase;
    match status.phase {
        FleetPhase::Converging => "converging",
        FleetPhase::Converged => "converged",
        FleetPhase::Degraded => "degraded",
        FleetPhase::Failed => "failed",
    }
}

fn node_label(phase: &NodePhase) -> String {
    match phase {
        NodePhase::Pending => "pending".to_string(),
        NodePhase::Eligible => "eligible".to_string(),
        NodePhase::Starting => "starting".to_string(),
        NodePhase::Started => "started".to_string(),
        NodePhase::Healthy => "healthy".to_string(),
        NodePhase::Failed { reason } => format!("failed ({reason})"),
        NodePhase::Blocked { on } => format!("blocked (on {on})"),
        NodePhase::Stopped => "stopped".to_string(),
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}
