//! `TaskFlow` reference server: in-memory task, team, and project service.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:8000
//! cargo run --bin taskflow-server
//!
//! # Run on custom address
//! cargo run --bin taskflow-server -- --bind 127.0.0.1:8080
//!
//! # Or via environment variable
//! TASKFLOW_SERVER_ADDR=127.0.0.1:8080 cargo run --bin taskflow-server
//! ```

use std::sync::Arc;

use clap::Parser;
use taskflow_server::config::{ServerCliArgs, ServerConfig};
use taskflow_server::service::{self, ServiceState};

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting taskflow server");

    let state = Arc::new(ServiceState::with_activity_limit(config.activity_limit));

    match service::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "taskflow server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    }
}
