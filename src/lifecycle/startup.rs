//! Startup orchestration.
//!
//! # Responsibilities
//! - Parse the upstream target and the listen address
//! - Connect the resource pool before anything listens
//! - Bind the listener and spawn the serve task
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)
//! - A pool that was connected is closed again if a later step fails

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::schema::BadgeConfig;
use crate::config::validation::ValidationError;
use crate::error::{ConfigError, StartupError, StoreError};
use crate::http::{AppState, HttpServer};
use crate::lifecycle::coordinator::{Coordinator, LifecycleState};
use crate::lifecycle::shutdown::Shutdown;
use crate::proxy::{Transport, Upstream};
use crate::store::{ResourcePool, ViewCounter};

/// Bring the server up and hand back the coordinator that owns it.
///
/// `connect` produces the pool; it is awaited before the listener is bound,
/// so a database outage means the port is never opened.
pub async fn launch<P, C>(
    config: &BadgeConfig,
    transport: Arc<dyn Transport>,
    connect: C,
) -> Result<Coordinator<P>, StartupError>
where
    P: ResourcePool + ViewCounter + Clone,
    C: Future<Output = Result<P, StoreError>>,
{
    let (state, _) = watch::channel(LifecycleState::Initializing);

    let upstream = Upstream::parse(&config.upstream.url)?;
    let addr = config.listener.socket_addr().map_err(|_| {
        ConfigError::Validation(vec![ValidationError::InvalidListenHost(
            config.listener.host.clone(),
        )])
    })?;

    let pool = connect.await?;

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(source) => {
            pool.close().await;
            return Err(StartupError::Bind { addr, source });
        }
    };
    let local_addr = match listener.local_addr() {
        Ok(local_addr) => local_addr,
        Err(source) => {
            pool.close().await;
            return Err(StartupError::Bind { addr, source });
        }
    };

    let counter: Arc<dyn ViewCounter> = Arc::new(pool.clone());
    let state_for_handlers = AppState::new(config, upstream, transport, counter);
    let server = HttpServer::new(state_for_handlers, &config.timeouts);

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tracing::info!(
        address = %local_addr,
        upstream = %config.upstream.url,
        services = config.services.len(),
        "Listening for connections"
    );

    Ok(Coordinator::new(
        pool,
        handle,
        shutdown,
        state,
        local_addr,
        Duration::from_secs(config.timeouts.shutdown_grace_secs),
    ))
}
