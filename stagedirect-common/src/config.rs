//! Bootstrap configuration loading
//!
//! Settings needed before the database is open: where the database lives,
//! where to listen, log level, and the merge workflow's policy knobs.
//!
//! Resolution order for the config file:
//! 1. Command-line argument (highest priority)
//! 2. `STAGEDIRECT_CONFIG` environment variable
//! 3. `<config dir>/stagedirect/config.toml`
//!
//! A missing file is not an error: compiled defaults are used and a warning is
//! logged. A file that exists but does not parse is an error.

use crate::dedup::ValidatedPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "STAGEDIRECT_CONFIG";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5730;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub merge: MergeConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            host: default_host(),
            port: default_port(),
            logging: LoggingConfig::default(),
            merge: MergeConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Company/contact merge settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// How `validated` is resolved on company merge
    #[serde(default)]
    pub validated_policy: ValidatedPolicy,

    /// Upper bound for a whole merge (lock wait included)
    #[serde(default = "default_merge_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            validated_policy: ValidatedPolicy::default(),
            timeout_ms: default_merge_timeout_ms(),
        }
    }
}

impl MergeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_merge_timeout_ms() -> u64 {
    10_000
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("stagedirect"))
        .unwrap_or_else(|| PathBuf::from("./stagedirect_data"))
        .join("stagedirect.db")
}

/// Pick the config file to read, if any
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    dirs::config_dir().map(|d| d.join("stagedirect").join("config.toml"))
}

/// Load bootstrap configuration, falling back to defaults when absent
pub fn load_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        info!("No config file location available, using defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

    if config.merge.timeout_ms == 0 {
        return Err(Error::Config("merge.timeout_ms must be positive".to_string()));
    }

    info!("Loaded config file {}", path.display());
    Ok(config)
}
