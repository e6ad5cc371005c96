//! Command line and environment overrides.
//!
//! Every option can be given as a flag or through the environment, so the
//! process can run from a config file, from environment alone, or a mix.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::read_config;
use crate::config::schema::{BadgeConfig, LogFormat};
use crate::config::validation::validate_config;
use crate::error::ConfigError;

#[derive(Debug, Default, Parser)]
#[command(name = "view-badge-proxy", version, about = "Profile view count badge front door")]
pub struct Args {
    /// Optional TOML config file; flags and environment take precedence.
    #[arg(short, long, env = "CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Port to listen on.
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Postgres connection string.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Service display names, e.g. `github:GitHub,gitlab:GitLab`.
    #[arg(long, env = "SERVICE_USER_MAP")]
    pub service_user_map: Option<String>,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Args {
    /// Build the final, validated configuration.
    pub fn resolve(self) -> Result<BadgeConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => BadgeConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(url) = self.database_url {
            config.database.url = url;
        }
        if let Some(raw) = self.service_user_map.as_deref() {
            config.services.extend(parse_service_map(raw)?);
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

/// Parse `key:value` pairs separated by commas.
pub fn parse_service_map(raw: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut services = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (service, name) = entry
            .split_once(':')
            .ok_or_else(|| ConfigError::ServiceMap(entry.to_string()))?;
        let (service, name) = (service.trim(), name.trim());
        if service.is_empty() || name.is_empty() {
            return Err(ConfigError::ServiceMap(entry.to_string()));
        }
        services.insert(service.to_string(), name.to_string());
    }
    Ok(services)
}
