// ABOUTME: Library root for cellrig - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod error;
pub mod fleet;
pub mod output;
pub mod probe;
pub mod runtime;
pub mod scheduler;
pub mod topology;
pub mod types;
