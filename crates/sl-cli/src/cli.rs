//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use sl_core::DatabaseDialect;

/// Sluice - versioned schema updates for CMS modules
#[derive(Parser, Debug)]
#[command(name = "sluice")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override the database path
    #[arg(short, long, global = true, env = "SLUICE_DATABASE")]
    pub target: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the system catalog and register discovered modules
    Init(InitArgs),

    /// Show installed and available schema versions per module
    Status(StatusArgs),

    /// Print the SQL pending updates would execute, without running it
    Plan(PlanArgs),

    /// Apply all pending updates in one process
    Run(RunArgs),

    /// Serve the update pages over HTTP
    Serve(ServeArgs),
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Register new modules at this version instead of their declared maximum
    #[arg(long)]
    pub baseline: Option<i64>,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Dialect to render statements for (default: from sluice.yml)
    #[arg(short, long)]
    pub dialect: Option<DatabaseDialect>,

    /// Start versions (module=N), defaulting to installed + 1
    #[arg(short, long = "start", value_name = "MODULE=N")]
    pub starts: Vec<String>,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Start versions (module=N), defaulting to installed + 1
    #[arg(short, long = "start", value_name = "MODULE=N")]
    pub starts: Vec<String>,

    /// Suppress the progress bar and per-statement report
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, default_value = "8080")]
    pub port: u16,

    /// Do not open a browser
    #[arg(long)]
    pub no_browser: bool,
}

/// Output formats for status
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned text table
    Table,
    /// JSON array
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
