//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Run pytest files concurrently and collect structured results
#[derive(Parser, Debug)]
#[command(name = "pytest-runner")]
#[command(version)]
#[command(about = "Run pytest files concurrently and collect structured results")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run test files
    Run(RunArgs),

    /// Show or create configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Test files to run
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Maximum number of files running at once
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Test executable
    #[arg(long)]
    pub command: Option<String>,

    /// Stream the report is written to (stderr, stdout)
    #[arg(long)]
    pub channel: Option<String>,

    /// Per-file timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Output format (table, json, json-pretty, summary)
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Working directory for the test processes
    #[arg(long)]
    pub root_dir: Option<PathBuf>,

    /// Save file results as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for config management
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write an example configuration file
    Init {
        /// Destination file
        #[arg(short, long, default_value = "pytest-runner.yaml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List supported environment variables
    Env,
}
