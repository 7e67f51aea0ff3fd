//! Configuration system for the Taskdeck client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskdeck/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error. The default service
//! URL points at a local emulator.

use std::path::PathBuf;
use std::time::Duration;

use crate::net::NetConfig;

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
    ui: UiFileConfig,
}

/// `[service]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServiceFileConfig {
    url: Option<String>,
    connect_timeout_secs: Option<u64>,
    channel_capacity: Option<usize>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_timeout_ms: Option<u64>,
    date_format: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket URL of the service.
    pub service_url: String,
    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,
    /// Channel capacity for command/event mpsc channels.
    pub channel_capacity: usize,
    /// Poll timeout for the TUI event loop.
    pub poll_timeout: Duration,
    /// chrono format string for creation dates in the task list.
    pub date_format: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_url: "ws://127.0.0.1:9400/ws".to_string(),
            connect_timeout: Duration::from_secs(10),
            channel_capacity: 256,
            poll_timeout: Duration::from_millis(50),
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicitly given config file cannot
    /// be read or any config file cannot be parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            service_url: cli
                .service_url
                .clone()
                .or_else(|| file.service.url.clone())
                .unwrap_or(defaults.service_url),
            connect_timeout: file
                .service
                .connect_timeout_secs
                .map_or(defaults.connect_timeout, Duration::from_secs),
            channel_capacity: file
                .service
                .channel_capacity
                .unwrap_or(defaults.channel_capacity),
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
            date_format: cli
                .date_format
                .clone()
                .or_else(|| file.ui.date_format.clone())
                .unwrap_or(defaults.date_format),
        }
    }

    /// Build a [`NetConfig`] from this configuration.
    #[must_use]
    pub fn to_net_config(&self) -> NetConfig {
        NetConfig {
            service_url: self.service_url.clone(),
            connect_timeout: self.connect_timeout,
            channel_capacity: self.channel_capacity,
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Terminal task manager")]
pub struct CliArgs {
    /// WebSocket URL of the service.
    #[arg(long, env = "TASKDECK_SERVICE_URL")]
    pub service_url: Option<String>,

    /// Path to config file (default: `~/.config/taskdeck/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Date display format (chrono format string).
    #[arg(long)]
    pub date_format: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKDECK_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskdeck.log`).
    #[arg(long)]
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
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            // No config dir available — use defaults.
            return Ok(ConfigFile::default());
        };
        config_dir.join("taskdeck").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
