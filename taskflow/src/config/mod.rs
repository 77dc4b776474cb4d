//! Configuration system for the `TaskFlow` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskflow/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use crate::session::DEFAULT_CHANNEL_CAPACITY;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    service: ServiceFileConfig,
    session: SessionFileConfig,
}

/// `[service]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServiceFileConfig {
    api_base: Option<String>,
    scheme: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    request_timeout_secs: Option<u64>,
}

/// `[session]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    actor: Option<String>,
    channel_capacity: Option<usize>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Scheme used when no base address is configured.
pub const DEFAULT_SCHEME: &str = "http";

/// Host used when no base address is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// Port used when no base address is configured.
pub const DEFAULT_PORT: u16 = 8000;

/// Identity written as `updated_by` when none is configured.
pub const DEFAULT_ACTOR: &str = "local-user";

/// Fully resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base address of the service, e.g. `http://localhost:8000`.
    pub api_base: String,
    /// Per-request timeout. `None` leaves timing to the transport.
    pub request_timeout: Option<Duration>,
    /// Identity written on every task write.
    pub actor: String,
    /// Capacity of the session command/event channels.
    pub channel_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: format!("{DEFAULT_SCHEME}://{DEFAULT_HOST}:{DEFAULT_PORT}"),
            request_timeout: None,
            actor: DEFAULT_ACTOR.to_string(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path
    /// (`~/.config/taskflow/config.toml`) is tried and silently ignored if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// An explicit base address wins outright; otherwise the base is built
    /// from scheme, host, and port, each taken from CLI, file, or default.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();
        let service = &file.service;

        let api_base = cli
            .api_base
            .clone()
            .or_else(|| service.api_base.clone())
            .unwrap_or_else(|| {
                let scheme = service.scheme.as_deref().unwrap_or(DEFAULT_SCHEME);
                let host = cli
                    .host
                    .as_deref()
                    .or(service.host.as_deref())
                    .unwrap_or(DEFAULT_HOST);
                let port = cli.port.or(service.port).unwrap_or(DEFAULT_PORT);
                format!("{scheme}://{host}:{port}")
            });

        Self {
            api_base,
            request_timeout: cli
                .timeout_secs
                .or(service.request_timeout_secs)
                .map(Duration::from_secs),
            actor: cli
                .actor
                .clone()
                .or_else(|| file.session.actor.clone())
                .unwrap_or(defaults.actor),
            channel_capacity: file
                .session
                .channel_capacity
                .unwrap_or(defaults.channel_capacity),
        }
    }
}

/// Global CLI options, shared by every subcommand.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct CliArgs {
    /// Base address of the service (overrides host and port).
    #[arg(long, global = true, env = "TASKFLOW_API_BASE")]
    pub api_base: Option<String>,

    /// Service host, used when no base address is set.
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Service port, used when no base address is set.
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Identity recorded as the writer of task changes.
    #[arg(long, global = true, env = "TASKFLOW_ACTOR")]
    pub actor: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Path to config file (default: `~/.config/taskflow/config.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info", env = "TASKFLOW_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskflow.log`).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("taskflow").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
