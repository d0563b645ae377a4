//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "PYTEST_RUNNER";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Worker count from PYTEST_RUNNER_WORKERS
    pub workers: Option<usize>,
    /// Test executable from PYTEST_RUNNER_COMMAND
    pub command: Option<String>,
    /// Per-file timeout from PYTEST_RUNNER_TIMEOUT
    pub timeout: Option<u64>,
    /// Colored output from PYTEST_RUNNER_COLOR
    pub color: Option<bool>,
    /// Log level from PYTEST_RUNNER_LOG
    pub log_level: Option<String>,
    /// Config file from PYTEST_RUNNER_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any `PYTEST_RUNNER_*` key lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}_{name}"));

        Self {
            workers: get("WORKERS").and_then(|v| v.parse().ok()),
            command: get("COMMAND"),
            timeout: get("TIMEOUT").and_then(|v| v.parse().ok()),
            color: get("COLOR").map(|v| parse_bool(&v)),
            log_level: get("LOG"),
            config_file: get("CONFIG"),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}

/// Print all PYTEST_RUNNER environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_WORKERS   Maximum concurrent test files");
    println!("  {ENV_PREFIX}_COMMAND   Test executable (default: py.test)");
    println!("  {ENV_PREFIX}_TIMEOUT   Per-file timeout in seconds");
    println!("  {ENV_PREFIX}_COLOR     Colored output (true/false)");
    println!("  {ENV_PREFIX}_LOG       Log level (trace, debug, info, warn, error)");
    println!("  {ENV_PREFIX}_CONFIG    Path to configuration file");
}
