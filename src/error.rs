//! Error types shared across subsystems.
//!
//! # Design Decisions
//! - Startup errors are fatal and carry enough context to explain the exit
//! - Per-request errors live in `http::response` and map to status codes
//! - Store and transport errors keep their source for structured logging

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::config::validation::ValidationError;
use crate::proxy::upstream::UpstreamError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid service map entry {0:?}, expected `service:display name`")]
    ServiceMap(String),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failures of the view store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("database query failed: {0}")]
    Query(#[source] sqlx::Error),
}

/// Failures talking to the badge renderer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build upstream client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("upstream request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    #[error("upstream connection limiter closed")]
    Closed,
}

/// Fatal errors raised before the server starts serving traffic.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid upstream target: {0}")]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] io::Error),
}
