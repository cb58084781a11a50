//! Configuration data types.

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::validation;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server name used as the prefix of numeric replies
    pub server_name: String,

    /// Enable debug logging to file
    pub debug: bool,

    /// Path to log directory
    pub log_path: PathBuf,

    /// Caller ID settings
    pub callerid: CallerIdConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_name: "irc.local".to_string(),
            debug: false,
            log_path: default_log_path(),
            callerid: CallerIdConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration and return errors if invalid.
    /// Delegates to the comprehensive validation module.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

/// The `[callerid]` table.
///
/// ```toml
/// [callerid]
/// maxaccepts = 16
/// operoverride = false
/// tracknick = false
/// cooldown = 60
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CallerIdConfig {
    /// Maximum number of ACCEPT entries per user
    pub maxaccepts: u32,

    /// Operators may message +g users without being accepted
    pub operoverride: bool,

    /// ACCEPT entries follow users across nick changes
    pub tracknick: bool,

    /// Seconds between notifications to a +g user
    pub cooldown: u64,
}

impl Default for CallerIdConfig {
    fn default() -> Self {
        Self {
            maxaccepts: 16,
            operoverride: false,
            tracknick: false,
            cooldown: 60,
        }
    }
}

/// Get default log path (relative to config directory).
/// This returns a placeholder; the actual path is set by ConfigService based on config file location.
pub fn default_log_path() -> PathBuf {
    default_log_path_for_config_dir(None)
}

/// Get log path based on config directory.
pub fn default_log_path_for_config_dir(config_dir: Option<&Path>) -> PathBuf {
    config_dir
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
                .join("callerid")
        })
        .join("logs")
}
