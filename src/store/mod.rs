//! View count storage.
//!
//! # Data Flow
//! ```text
//! Badge request (service, user)
//!     → ViewCounter::increment (atomic upsert)
//!     → new count injected into the badge query
//!
//! Shutdown:
//!     Lifecycle coordinator → ResourcePool::close (waits for checked-out connections)
//! ```
//!
//! # Design Decisions
//! - Request handlers only see `ViewCounter`; closing is reserved for the
//!   lifecycle coordinator through `ResourcePool`
//! - Both traits return boxed futures so they work as trait objects

pub mod postgres;

use futures_util::future::BoxFuture;

use crate::error::StoreError;

pub use postgres::PgStore;

/// Counts badge views per `(service, user)`.
pub trait ViewCounter: Send + Sync + 'static {
    /// Record one view and return the updated total.
    fn increment<'a>(&'a self, service: &'a str, user: &'a str)
        -> BoxFuture<'a, Result<i64, StoreError>>;
}

/// An owned resource released exactly once at shutdown.
pub trait ResourcePool: Send + Sync + 'static {
    /// Close the pool, waiting for in-use connections to be returned.
    fn close(&self) -> BoxFuture<'_, ()>;
}
