//! Request-to-proxy translation.
//!
//! # Data Flow
//! ```text
//! Matched badge request + view count
//!     → badge.rs (label/message/color query)
//!     → director.rs (copy, rewrite URL/host/headers)
//!     → transport.rs (pooled single-host client)
//!     → upstream response streamed back
//! ```
//!
//! # Design Decisions
//! - Upstream target parsed once at startup, immutable afterwards
//! - Director is pure; all I/O lives in the transport
//! - Transport is a trait so dispatch can be exercised without a network

pub mod badge;
pub mod director;
pub mod transport;
pub mod upstream;

pub use badge::{BadgeQuery, BadgeStyle};
pub use director::Director;
pub use transport::{PooledTransport, Transport, TransportSettings};
pub use upstream::Upstream;
