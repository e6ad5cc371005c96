//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Parse upstream → Connect pool → Bind listener → Spawn serve task
//!
//! Running (coordinator.rs):
//!     Race: termination signal vs. serve task exit
//!
//! Shutdown (coordinator.rs, shutdown.rs):
//!     Stop accepting → Drain within grace period → Close pool → Stopped
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM/SIGHUP/SIGABRT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: upstream and pool first, listener last
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has timeout: remaining connections aborted after the deadline

pub mod coordinator;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use coordinator::{Coordinator, DrainOutcome, LifecycleState, ShutdownReport, ShutdownTrigger};
pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::{TerminationSignal, TerminationSignals};
pub use startup::launch;
