//! Configuration system for the Taskdeck emulator.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskdeck-emulator/config.toml`)
//! 4. Compiled defaults
//!
//! The default configuration registers the composite index the task query
//! needs (`tasks` filtered on `user_id`, ordered by `created_at`), so a
//! stock emulator serves the client out of the box.

use std::path::PathBuf;

/// Errors that can occur when loading emulator configuration.
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

/// Top-level TOML config file structure for the emulator.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct EmulatorConfigFile {
    server: ServerFileConfig,
    auth: AuthFileConfig,
    /// `[[index]]` array of composite index registrations.
    index: Option<Vec<IndexFileConfig>>,
}

/// `[server]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    bind_addr: Option<String>,
}

/// `[auth]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct AuthFileConfig {
    federated_email: Option<String>,
    popup_blocked: Option<bool>,
}

/// One `[[index]]` entry of the config file.
#[derive(Debug, serde::Deserialize)]
struct IndexFileConfig {
    collection: String,
    filter_field: String,
    order_field: String,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the emulator.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Taskdeck service emulator")]
pub struct EmulatorCliArgs {
    /// Address to bind the emulator to.
    #[arg(short, long, env = "TASKDECK_EMULATOR_ADDR")]
    pub bind: Option<String>,

    /// Email handed out by federated sign-in.
    #[arg(long, env = "TASKDECK_FEDERATED_EMAIL")]
    pub federated_email: Option<String>,

    /// Path to config file (default: `~/.config/taskdeck-emulator/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKDECK_EMULATOR_LOG")]
    pub log_level: String,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// A composite index registration as configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Collection the index covers.
    pub collection: String,
    /// Field of the equality filter.
    pub filter_field: String,
    /// Field of the ordering clause.
    pub order_field: String,
}

/// Fully resolved emulator configuration.
#[derive(Debug, Clone)]
pub struct EmulatorConfig {
    /// Address the WebSocket endpoint binds to.
    pub bind_addr: String,
    /// Identity handed out by federated sign-in.
    pub federated_email: String,
    /// When set, federated sign-in fails with the popup-blocked code.
    pub popup_blocked: bool,
    /// Registered composite indexes.
    pub composite_indexes: Vec<IndexSpec>,
    /// Log level filter.
    pub log_level: String,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9400".to_string(),
            federated_email: "demo.user@example.com".to_string(),
            popup_blocked: false,
            composite_indexes: vec![IndexSpec {
                collection: "tasks".to_string(),
                filter_field: "user_id".to_string(),
                order_field: "created_at".to_string(),
            }],
            log_level: "info".to_string(),
        }
    }
}

impl EmulatorConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicitly given config file cannot be
    /// read or any config file cannot be parsed.
    pub fn load(cli: &EmulatorCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a configuration from CLI args and a parsed config file.
    /// Priority: CLI > file > default.
    fn resolve(cli: &EmulatorCliArgs, file: &EmulatorConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: cli
                .bind
                .clone()
                .or_else(|| file.server.bind_addr.clone())
                .unwrap_or(defaults.bind_addr),
            federated_email: cli
                .federated_email
                .clone()
                .or_else(|| file.auth.federated_email.clone())
                .unwrap_or(defaults.federated_email),
            popup_blocked: file.auth.popup_blocked.unwrap_or(defaults.popup_blocked),
            composite_indexes: file.index.as_ref().map_or(defaults.composite_indexes, |v| {
                v.iter()
                    .map(|idx| IndexSpec {
                        collection: idx.collection.clone(),
                        filter_field: idx.filter_field.clone(),
                        order_field: idx.order_field.clone(),
                    })
                    .collect()
            }),
            log_level: cli.log_level.clone(),
        }
    }
}

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and a missing
/// file is treated as empty config.
fn load_config_file(
    explicit_path: Option<&std::path::Path>,
) -> Result<EmulatorConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(EmulatorConfigFile::default());
        };
        config_dir.join("taskdeck-emulator").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(EmulatorConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
