//! pytest-runner - Concurrent pytest file runner
//!
//! Runs every given test file in its own `py.test --json` process, at most
//! `--workers` at a time, and prints a normalized result per file as soon as
//! it finishes.
//!
//! ## Usage
//!
//! ```bash
//! # Run two files, four at a time at most
//! pytest-runner run tests/test_api.py tests/test_db.py --workers 4
//!
//! # Machine readable output, results saved to disk
//! pytest-runner run tests/test_*.py --format json --output results.json
//!
//! # Kill files that take longer than two minutes
//! pytest-runner run tests/test_slow.py --timeout 120
//!
//! # Write an example configuration
//! pytest-runner config init
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

mod cli;

use cli::{Args, ConfigAction};
use pytest_runner::config::{print_env_help, AppConfig, ConfigFile, EnvConfig};
use pytest_runner::error::TestFailure;
use pytest_runner::executor::{
    CancelSignal, PytestExecutor, ReportChannel, RunConfig, RunObserver, TestRunner,
};
use pytest_runner::models::{ProjectConfig, TestContext, TestDescriptor, TestFileResult};
use pytest_runner::output::{write_results_to_file, OutputFormat, ResultFormatter};
use pytest_runner::utils::logger::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env = EnvConfig::load();

    let config_path = args
        .config
        .clone()
        .or_else(|| env.config_file.as_ref().map(Into::into));
    let mut config = match config_path {
        Some(path) => ConfigFile::load(path)?.runner,
        None => ConfigFile::load_default()?.runner,
    };
    config.apply_env(&env);
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }

    let level = config.log_level.parse::<LogLevel>().unwrap_or_else(|e| {
        eprintln!("{e}, falling back to {}", LogLevel::default());
        LogLevel::default()
    });
    init_logger(level);

    match args.command {
        cli::Command::Run(run_args) => {
            if !run_tests(run_args, config).await? {
                std::process::exit(1);
            }
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args, &config)?;
        }
    }

    Ok(())
}

/// Prints each file's outcome as it arrives
struct ConsoleObserver {
    formatter: ResultFormatter,
    results: Mutex<Vec<TestFileResult>>,
}

impl RunObserver for ConsoleObserver {
    fn on_start(&self, test: &TestDescriptor) -> Result<()> {
        info!("RUNS {}", test);
        Ok(())
    }

    fn on_result(&self, _test: &TestDescriptor, result: TestFileResult) -> Result<()> {
        println!("{}", self.formatter.format_result(&result));
        self.results
            .lock()
            .map_err(|_| anyhow::anyhow!("result store poisoned"))?
            .push(result);
        Ok(())
    }

    fn on_failure(&self, test: &TestDescriptor, failure: TestFailure) -> Result<()> {
        println!("{}", self.formatter.format_failure(test, &failure));
        Ok(())
    }
}

/// Run the given files; returns whether every file passed
async fn run_tests(args: cli::RunArgs, mut config: AppConfig) -> Result<bool> {
    if let Some(workers) = args.workers {
        config.max_workers = workers;
    }
    if let Some(command) = args.command {
        config.command = command;
    }
    if let Some(channel) = &args.channel {
        config.report_channel = ReportChannel::from_str(channel)
            .ok_or_else(|| anyhow::anyhow!("Unknown report channel: {channel}"))?;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = Some(timeout);
    }
    if args.no_color {
        config.colorize = false;
    }
    config.validate()?;

    let format = OutputFormat::from_str(&args.format)
        .ok_or_else(|| anyhow::anyhow!("Unknown output format: {}", args.format))?;
    let formatter = if config.colorize {
        ResultFormatter::new(format)
    } else {
        ResultFormatter::new(format).no_color()
    };

    let project = ProjectConfig {
        name: None,
        root_dir: args.root_dir,
    };
    let tests = TestDescriptor::from_paths(args.paths, Arc::new(TestContext::new(project)));

    let cancel = CancelSignal::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if cancel.cancel() {
                    warn!("Interrupted, waiting for running tests to finish (Ctrl-C again to abort)");
                } else {
                    warn!("Interrupted twice, aborting");
                    std::process::exit(130);
                }
            }
        }
    });

    let runner = TestRunner::new(
        RunConfig::new(config.max_workers).with_cancel(cancel),
        Arc::new(PytestExecutor::from_config(&config)),
    );
    let observer = Arc::new(ConsoleObserver {
        formatter,
        results: Mutex::new(Vec::new()),
    });

    let summary = runner.run_tests(&tests, observer.clone()).await?;
    println!("{}", observer.formatter.format_summary(&summary));

    if let Some(path) = args.output {
        let results = observer
            .results
            .lock()
            .map_err(|_| anyhow::anyhow!("result store poisoned"))?;
        write_results_to_file(&path, &results)
            .with_context(|| format!("Failed to write results to {}", path.display()))?;
        info!("Results saved to {}", path.display());
    }

    Ok(summary.is_all_passed())
}

fn manage_config(args: cli::ConfigArgs, config: &AppConfig) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let file = ConfigFile {
                runner: config.clone(),
                ..ConfigFile::default()
            };
            print!("{}", serde_yaml::to_string(&file)?);
        }
        ConfigAction::Init { path, force } => {
            init_config(&path, force)?;
            println!("Configuration written to {}", path.display());
        }
        ConfigAction::Env => print_env_help(),
    }
    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    ConfigFile::example().save(path)
}
