//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(
    name = "cryostat",
    version,
    about = "Cryostat resistivity measurement CLI"
)]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/cryostat.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
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
    /// Run measurement cycles over the simulated instruments
    Run {
        /// Temperature setpoint in K; repeat to step through a list, one
        /// averaging window per setpoint
        #[arg(
            long = "setpoint",
            value_name = "K",
            required = true,
            allow_negative_numbers = true
        )]
        setpoints: Vec<f64>,

        /// Averaging window length in seconds (overrides config)
        #[arg(long, value_name = "S")]
        integration_s: Option<f64>,

        /// Required in-band dwell in seconds (overrides config)
        #[arg(long, value_name = "S")]
        stable_s: Option<f64>,

        /// Tolerance band half-width in K (overrides config)
        #[arg(long, value_name = "K")]
        temp_tol: Option<f64>,

        /// Result file path (overrides config sample.file)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Sample name for the file header
        #[arg(long)]
        sample: Option<String>,

        /// User name for the file header
        #[arg(long)]
        user: Option<String>,

        /// Material for the file header
        #[arg(long)]
        material: Option<String>,

        /// Abort if the run exceeds this many seconds (0 = unlimited)
        #[arg(long, value_name = "S", default_value_t = 0.0)]
        max_run_s: f64,

        /// Print live phase/temperature lines while running
        #[arg(long, action = ArgAction::SetTrue)]
        progress: bool,
    },
    /// Quick health check (one read from each simulated port)
    SelfCheck,
}
