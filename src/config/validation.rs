//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Required values present (database URL, service map)
//! - Validate value ranges (timeouts and pool limits > 0)
//! - Upstream target is an absolute http(s) URL with a host
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BadgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::BadgeConfig;
use crate::proxy::upstream::Upstream;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("database.url is required")]
    MissingDatabaseUrl,

    #[error("services must map at least one service to a display name")]
    NoServices,

    #[error("service identifier {0:?} must be a single non-empty path segment")]
    InvalidServiceId(String),

    #[error("listener.host {0:?} is not an IP address")]
    InvalidListenHost(String),

    #[error("upstream.url {url:?} is invalid: {reason}")]
    InvalidUpstream { url: String, reason: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

pub fn validate_config(config: &BadgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.database.url.trim().is_empty() {
        errors.push(ValidationError::MissingDatabaseUrl);
    }

    if config.services.is_empty() {
        errors.push(ValidationError::NoServices);
    }
    for service in config.services.keys() {
        if service.is_empty() || service.contains('/') {
            errors.push(ValidationError::InvalidServiceId(service.clone()));
        }
    }

    if config.listener.socket_addr().is_err() {
        errors.push(ValidationError::InvalidListenHost(config.listener.host.clone()));
    }

    if let Err(e) = Upstream::parse(&config.upstream.url) {
        errors.push(ValidationError::InvalidUpstream {
            url: config.upstream.url.clone(),
            reason: e.to_string(),
        });
    }

    let non_zero = [
        ("database.max_connections", config.database.max_connections as u64),
        ("database.connect_timeout_secs", config.database.connect_timeout_secs),
        ("upstream.max_conns_per_host", config.upstream.max_conns_per_host as u64),
        ("upstream.idle_timeout_secs", config.upstream.idle_timeout_secs),
        ("upstream.request_timeout_secs", config.upstream.request_timeout_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ];
    for (field, value) in non_zero {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
