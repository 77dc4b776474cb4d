//! `taskflow`: command-line client for a `TaskFlow` service.
//!
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/taskflow/config.toml`).
//!
//! ```bash
//! # List open tasks for one member against a local service
//! cargo run --bin taskflow -- tasks --assignee m1 --status pending
//!
//! # Point at another service
//! TASKFLOW_API_BASE=http://10.0.0.5:8000 cargo run --bin taskflow -- metrics
//! ```

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use taskflow::cli::{self, Cli, Command};
use taskflow::config::ClientConfig;
use taskflow::remote::http::HttpRemote;
use taskflow::workspace::Workspace;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ClientConfig::load(&cli.global) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Logs go to a file so they never interleave with command output.
    let _log_guard = init_logging(&cli.global.log_level, cli.global.log_file.as_deref());

    tracing::info!(api_base = %config.api_base, "taskflow starting");

    let remote = match HttpRemote::new(&config.api_base, config.request_timeout) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let workspace = Workspace::new(remote, config.actor);

    let command = cli.command.unwrap_or(Command::Tasks {
        assignee: None,
        project: None,
        status: None,
        priority: None,
        search: None,
    });
    let mut stdout = std::io::stdout().lock();
    match cli::run(&workspace, command, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskflow.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
