//! Configuration module
//!
//! Handles loading and layering runner configuration: defaults, then a
//! config file, then `PYTEST_RUNNER_*` environment variables, then CLI flags.

mod env;
mod file;

pub use env::{print_env_help, EnvConfig};
pub use file::ConfigFile;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::executor::ReportChannel;

/// Runner configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Maximum number of test files running at once
    pub max_workers: usize,

    /// Test executable
    pub command: String,

    /// Arguments placed before `--json=<channel>`
    pub extra_args: Vec<String>,

    /// Stream the report is written to
    pub report_channel: ReportChannel,

    /// Per-file timeout in seconds; unset means wait forever
    pub timeout_secs: Option<u64>,

    /// Colorize failure messages and terminal output
    pub colorize: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_workers: default_workers(),
            command: "py.test".to_string(),
            extra_args: Vec::new(),
            report_channel: ReportChannel::Stderr,
            timeout_secs: None,
            colorize: true,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            anyhow::bail!("max_workers must be at least 1");
        }
        if self.command.trim().is_empty() {
            anyhow::bail!("command must not be empty");
        }
        if self.timeout_secs == Some(0) {
            anyhow::bail!("timeout_secs must be positive when set");
        }
        Ok(())
    }

    /// Apply environment overrides on top of this configuration
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(workers) = env.workers {
            self.max_workers = workers;
        }
        if let Some(command) = &env.command {
            self.command = command.clone();
        }
        if let Some(timeout) = env.timeout {
            self.timeout_secs = Some(timeout);
        }
        if let Some(color) = env.color {
            self.colorize = color;
        }
        if let Some(level) = &env.log_level {
            self.log_level = level.clone();
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.command, "py.test");
        assert_eq!(config.report_channel, ReportChannel::Stderr);
        assert!(config.max_workers >= 1);
        assert!(config.timeout_secs.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = AppConfig {
            max_workers: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_env() {
        let mut config = AppConfig::default();
        let env = EnvConfig {
            workers: Some(2),
            command: Some("pytest".to_string()),
            timeout: Some(90),
            color: Some(false),
            ..Default::default()
        };

        config.apply_env(&env);
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.command, "pytest");
        assert_eq!(config.timeout_secs, Some(90));
        assert!(!config.colorize);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runner.yaml");
        std::fs::write(&path, "runner:\n  max_workers: 3\n  report_channel: stdout\n").unwrap();

        let config = ConfigFile::load(&path).unwrap().runner;
        assert_eq!(config.max_workers, 3);
        assert_eq!(config.report_channel, ReportChannel::Stdout);
        assert_eq!(config.command, "py.test");
    }
}
