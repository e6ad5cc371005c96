//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGINT, SIGTERM, SIGHUP, SIGABRT) before serving
//! - Resolve to whichever termination signal arrives first
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are installed up front so a signal during startup is not lost
//! - All four signals mean the same thing: begin graceful shutdown

use std::fmt;
use std::io;

/// A signal that asks the process to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
    Hangup,
    Abort,
}

impl TerminationSignal {
    pub fn name(self) -> &'static str {
        match self {
            TerminationSignal::Interrupt => "SIGINT",
            TerminationSignal::Terminate => "SIGTERM",
            TerminationSignal::Hangup => "SIGHUP",
            TerminationSignal::Abort => "SIGABRT",
        }
    }
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(unix)]
mod imp {
    use std::io;

    use tokio::signal::unix::{signal, Signal, SignalKind};

    use super::TerminationSignal;

    const SIGABRT: i32 = 6;

    pub struct Handlers {
        interrupt: Signal,
        terminate: Signal,
        hangup: Signal,
        abort: Signal,
    }

    impl Handlers {
        pub fn install() -> io::Result<Self> {
            Ok(Self {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
                hangup: signal(SignalKind::hangup())?,
                abort: signal(SignalKind::from_raw(SIGABRT))?,
            })
        }

        pub async fn recv(&mut self) -> TerminationSignal {
            tokio::select! {
                _ = self.interrupt.recv() => TerminationSignal::Interrupt,
                _ = self.terminate.recv() => TerminationSignal::Terminate,
                _ = self.hangup.recv() => TerminationSignal::Hangup,
                _ = self.abort.recv() => TerminationSignal::Abort,
            }
        }
    }
}

#[cfg(not(unix))]
mod imp {
    use std::io;

    use super::TerminationSignal;

    pub struct Handlers;

    impl Handlers {
        pub fn install() -> io::Result<Self> {
            Ok(Self)
        }

        pub async fn recv(&mut self) -> TerminationSignal {
            match tokio::signal::ctrl_c().await {
                Ok(()) => TerminationSignal::Interrupt,
                Err(e) => {
                    tracing::error!(error = %e, "Ctrl+C handler failed");
                    std::future::pending().await
                }
            }
        }
    }
}

/// Installed termination handlers.
pub struct TerminationSignals {
    handlers: imp::Handlers,
}

impl TerminationSignals {
    /// Register every handler. Must be called from within a Tokio runtime.
    pub fn install() -> io::Result<Self> {
        let handlers = imp::Handlers::install()?;
        tracing::debug!("Signal handlers installed");
        Ok(Self { handlers })
    }

    /// Wait for the next termination signal.
    pub async fn recv(&mut self) -> TerminationSignal {
        let signal = self.handlers.recv().await;
        tracing::info!(signal = %signal, "Termination signal received");
        signal
    }
}
