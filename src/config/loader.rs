//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::BadgeConfig;
use crate::error::ConfigError;

/// Parse a TOML config file without validating it.
///
/// Used when further values (environment, CLI) are layered on before
/// validation runs.
pub fn read_config(path: &Path) -> Result<BadgeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: BadgeConfig = toml::from_str(&content)?;
    Ok(config)
}
