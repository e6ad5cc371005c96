//! Process lifecycle after startup.
//!
//! # Responsibilities
//! - Race termination signals against the serve task
//! - Drain in-flight requests when a signal wins, within a grace period
//! - Close the resource pool exactly once, then report
//!
//! # Design Decisions
//! - Exactly one trigger wins the race; the losing branch is dropped
//! - The pool is closed only after the race resolves and draining ends
//! - State changes are published on a watch channel

use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};

use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::TerminationSignal;
use crate::store::ResourcePool;

/// Where the process is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Initializing,
    Running,
    ShuttingDown,
    Stopped,
}

/// How the serve task ended.
#[derive(Debug)]
pub enum ServeExit {
    Clean,
    Failed(io::Error),
    Panicked,
    Cancelled,
}

impl ServeExit {
    fn from_join(result: Result<io::Result<()>, JoinError>) -> Self {
        match result {
            Ok(Ok(())) => ServeExit::Clean,
            Ok(Err(e)) => ServeExit::Failed(e),
            Err(e) if e.is_panic() => ServeExit::Panicked,
            Err(_) => ServeExit::Cancelled,
        }
    }
}

impl fmt::Display for ServeExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServeExit::Clean => f.write_str("returned"),
            ServeExit::Failed(e) => write!(f, "failed: {}", e),
            ServeExit::Panicked => f.write_str("panicked"),
            ServeExit::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// What ended the running phase.
#[derive(Debug)]
pub enum ShutdownTrigger {
    Signal(TerminationSignal),
    ServeExited(ServeExit),
}

/// Outcome of draining in-flight requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The serve task was already gone.
    NotNeeded,
    Completed,
    /// The grace period ran out and the serve task was aborted.
    Aborted,
}

#[derive(Debug)]
pub struct ShutdownReport {
    pub trigger: ShutdownTrigger,
    pub drain: DrainOutcome,
}

impl ShutdownReport {
    /// True unless the server stopped on its own with an error.
    pub fn is_orderly(&self) -> bool {
        matches!(
            self.trigger,
            ShutdownTrigger::Signal(_) | ShutdownTrigger::ServeExited(ServeExit::Clean)
        )
    }
}

/// Owns the serve task and the pool once the server is running.
pub struct Coordinator<P: ResourcePool> {
    pool: P,
    server: JoinHandle<io::Result<()>>,
    shutdown: Shutdown,
    state: watch::Sender<LifecycleState>,
    local_addr: SocketAddr,
    grace: Duration,
}

impl<P: ResourcePool> Coordinator<P> {
    pub(crate) fn new(
        pool: P,
        server: JoinHandle<io::Result<()>>,
        shutdown: Shutdown,
        state: watch::Sender<LifecycleState>,
        local_addr: SocketAddr,
        grace: Duration,
    ) -> Self {
        state.send_replace(LifecycleState::Running);
        Self {
            pool,
            server,
            shutdown,
            state,
            local_addr,
            grace,
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Run until `termination` resolves or the server exits, then shut down.
    pub async fn run<F>(mut self, termination: F) -> ShutdownReport
    where
        F: Future<Output = TerminationSignal>,
    {
        let trigger = tokio::select! {
            signal = termination => ShutdownTrigger::Signal(signal),
            exit = &mut self.server => ShutdownTrigger::ServeExited(ServeExit::from_join(exit)),
        };

        self.state.send_replace(LifecycleState::ShuttingDown);
        let drain = match &trigger {
            ShutdownTrigger::Signal(signal) => {
                tracing::info!(signal = %signal, grace_secs = self.grace.as_secs(), "Shutting down");
                self.drain().await
            }
            ShutdownTrigger::ServeExited(exit @ ServeExit::Clean) => {
                tracing::warn!(exit = %exit, "HTTP server stopped unexpectedly");
                DrainOutcome::NotNeeded
            }
            ShutdownTrigger::ServeExited(exit) => {
                tracing::error!(exit = %exit, "HTTP server stopped unexpectedly");
                DrainOutcome::NotNeeded
            }
        };

        tracing::info!("Closing database pool");
        self.pool.close().await;

        self.state.send_replace(LifecycleState::Stopped);
        tracing::info!(?drain, "Shutdown complete");
        ShutdownReport { trigger, drain }
    }

    async fn drain(&mut self) -> DrainOutcome {
        self.shutdown.trigger();
        match tokio::time::timeout(self.grace, &mut self.server).await {
            Ok(exit) => {
                match ServeExit::from_join(exit) {
                    ServeExit::Clean => tracing::debug!("In-flight requests drained"),
                    other => tracing::error!(exit = %other, "HTTP server failed while draining"),
                }
                DrainOutcome::Completed
            }
            Err(_) => {
                tracing::warn!(
                    grace_secs = self.grace.as_secs(),
                    "Grace period elapsed, aborting remaining connections"
                );
                self.server.abort();
                DrainOutcome::Aborted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use futures_util::future::BoxFuture;

    #[derive(Clone, Default)]
    struct CountingPool {
        closes: Arc<AtomicUsize>,
    }

    impl ResourcePool for CountingPool {
        fn close(&self) -> BoxFuture<'_, ()> {
            Box::pin(async move {
                self.closes.fetch_add(1, Ordering::SeqCst);
            })
        }
    }

    fn coordinator(
        pool: CountingPool,
        server: JoinHandle<io::Result<()>>,
        shutdown: Shutdown,
        grace: Duration,
    ) -> Coordinator<CountingPool> {
        let (state, _) = watch::channel(LifecycleState::Initializing);
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        Coordinator::new(pool, server, shutdown, state, addr, grace)
    }

    #[tokio::test]
    async fn signal_drains_then_closes_once() {
        let pool = CountingPool::default();
        let shutdown = Shutdown::new();
        let signal = shutdown.subscribe();
        let server = tokio::spawn(async move {
            signal.wait().await;
            Ok(())
        });

        let coordinator = coordinator(pool.clone(), server, shutdown, Duration::from_secs(5));
        assert_eq!(coordinator.state(), LifecycleState::Running);
        let mut states = coordinator.subscribe_state();

        let report = coordinator.run(async { TerminationSignal::Terminate }).await;

        assert!(matches!(report.trigger, ShutdownTrigger::Signal(TerminationSignal::Terminate)));
        assert_eq!(report.drain, DrainOutcome::Completed);
        assert!(report.is_orderly());
        assert_eq!(pool.closes.load(Ordering::SeqCst), 1);
        assert_eq!(*states.borrow_and_update(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn serve_failure_closes_once() {
        let pool = CountingPool::default();
        let server = tokio::spawn(async { Err(io::Error::other("accept failed")) });

        let report = coordinator(pool.clone(), server, Shutdown::new(), Duration::from_secs(5))
            .run(std::future::pending())
            .await;

        assert!(matches!(
            report.trigger,
            ShutdownTrigger::ServeExited(ServeExit::Failed(_))
        ));
        assert_eq!(report.drain, DrainOutcome::NotNeeded);
        assert!(!report.is_orderly());
        assert_eq!(pool.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn serve_panic_is_a_trigger() {
        let pool = CountingPool::default();
        let server: JoinHandle<io::Result<()>> = tokio::spawn(async { panic!("serve loop bug") });

        let report = coordinator(pool.clone(), server, Shutdown::new(), Duration::from_secs(5))
            .run(std::future::pending())
            .await;

        assert!(matches!(report.trigger, ShutdownTrigger::ServeExited(ServeExit::Panicked)));
        assert_eq!(pool.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_server_is_aborted_after_grace() {
        let pool = CountingPool::default();
        // Ignores the shutdown signal, like a connection that never finishes.
        let server = tokio::spawn(std::future::pending::<io::Result<()>>());

        let report = coordinator(pool.clone(), server, Shutdown::new(), Duration::from_secs(10))
            .run(async { TerminationSignal::Interrupt })
            .await;

        assert_eq!(report.drain, DrainOutcome::Aborted);
        assert_eq!(pool.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn late_signal_is_ignored_after_serve_exit() {
        let pool = CountingPool::default();
        let server = tokio::spawn(async { Ok(()) });

        let report = coordinator(pool.clone(), server, Shutdown::new(), Duration::from_secs(5))
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                TerminationSignal::Hangup
            })
            .await;

        assert!(matches!(report.trigger, ShutdownTrigger::ServeExited(ServeExit::Clean)));
        assert!(report.is_orderly());
        assert_eq!(pool.closes.load(Ordering::SeqCst), 1);
    }
}
