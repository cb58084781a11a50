//! Configuration validation.

use anyhow::{bail, Result};
use regex::Regex;

use super::Config;

/// Hostname-like server name: dot-separated labels of letters, digits and `-`.
const SERVER_NAME_PATTERN: &str = r"^[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?)*$";

/// Validate configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Validate log path
    if !config.log_path.as_os_str().is_empty() {
        // Path will be created if it doesn't exist, so just check it's valid
        if config.log_path.to_string_lossy().contains('\0') {
            bail!("Invalid log_path: contains null character");
        }
    }

    if config.server_name.is_empty() {
        bail!("server_name cannot be empty");
    }
    let pattern = Regex::new(SERVER_NAME_PATTERN)?;
    if !pattern.is_match(&config.server_name) {
        bail!("server_name '{}' is not a valid host name", config.server_name);
    }

    if config.callerid.maxaccepts == 0 {
        bail!("callerid.maxaccepts must be at least 1");
    }

    Ok(())
}
