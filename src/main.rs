//! Profile view badge front door
//!
//! Counts a view and forwards the badge request to a static badge renderer.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────────┐
//!                              │                  BADGE FRONT DOOR                     │
//!                              │                                                       │
//!     Client Request           │  ┌─────────┐    ┌─────────┐    ┌──────────────┐      │
//!     ─────────────────────────┼─▶│  http   │───▶│ routing │───▶│    store     │      │
//!                              │  │ server  │    │ table   │    │ view counter │      │
//!                              │  └─────────┘    └─────────┘    └──────┬───────┘      │
//!                              │                                       │               │
//!                              │                                       ▼               │
//!                              │                               ┌──────────────┐       │
//!                              │                               │    proxy     │       │
//!                              │                               │   director   │       │
//!                              │                               └──────┬───────┘       │
//!                              │                                       │               │
//!                              │                                       ▼               │
//!     Client Response          │  ┌─────────┐                  ┌──────────────┐       │
//!     ◀────────────────────────┼──│response │◀─────────────────│  transport   │◀──────┼──── Badge
//!                              │  │  relay  │                  │ (pooled)     │       │     Renderer
//!                              │  └─────────┘                  └──────────────┘       │
//!                              │                                                       │
//!                              │  ┌─────────────────────────────────────────────────┐ │
//!                              │  │              Cross-Cutting Concerns              │ │
//!                              │  │  ┌─────────┐ ┌──────────┐ ┌──────────┐ ┌──────┐ │ │
//!                              │  │  │ config  │ │observa-  │ │ security │ │life- │ │ │
//!                              │  │  │         │ │ bility   │ │ headers  │ │cycle │ │ │
//!                              │  │  └─────────┘ └──────────┘ └──────────┘ └──────┘ │ │
//!                              │  └─────────────────────────────────────────────────┘ │
//!                              └──────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use view_badge_proxy::config::schema::ObservabilityConfig;
use view_badge_proxy::config::Args;
use view_badge_proxy::error::StartupError;
use view_badge_proxy::lifecycle::{launch, TerminationSignals};
use view_badge_proxy::observability::{logging, metrics};
use view_badge_proxy::proxy::{PooledTransport, Transport, TransportSettings};
use view_badge_proxy::store::PgStore;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Args::parse().resolve() {
        Ok(config) => config,
        Err(e) => {
            logging::init(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "view-badge-proxy starting");
    tracing::info!(
        port = config.listener.port,
        upstream = %config.upstream.url,
        services = config.services.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to install metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut signals = match TerminationSignals::install() {
        Ok(signals) => signals,
        Err(e) => {
            tracing::error!(error = %StartupError::Signals(e), "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    let transport: Arc<dyn Transport> =
        match PooledTransport::new(TransportSettings::from(&config.upstream)) {
            Ok(transport) => Arc::new(transport),
            Err(e) => {
                tracing::error!(error = %StartupError::from(e), "Startup failed");
                return ExitCode::FAILURE;
            }
        };

    let coordinator = match launch(&config, transport, PgStore::connect(&config.database)).await {
        Ok(coordinator) => coordinator,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    let report = coordinator.run(signals.recv()).await;
    if report.is_orderly() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
