//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "linebot", version, about = "Line follower CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/linebot.toml")]
    pub config: PathBuf,

    /// Print results as JSON instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the supervisory loop against the simulated course
    Run {
        /// Stop after this many supervisory episodes (default: run until Ctrl-C)
        #[arg(long, value_name = "N")]
        episodes: Option<u32>,
    },
    /// Quick health check (config parses, simulated rig assembles)
    SelfCheck,
    /// Fit classification thresholds from a labelled surface CSV
    Calibrate {
        /// CSV with `surface,brightness` rows (surface: line|floor)
        #[arg(long, value_name = "FILE")]
        csv: PathBuf,
    },
    /// Record a short simulated run and print its telemetry as JSON lines
    Dump {
        /// Milliseconds of odometry to record before downloading
        #[arg(long, value_name = "MS", default_value_t = 500)]
        record_ms: u64,
    },
}
