//! Header hygiene for proxied traffic.
//!
//! # Data Flow
//! ```text
//! Inbound request copy:
//!     → headers.rs (strip hop-by-hop, append X-Forwarded-For)
//!     → director rewrites host/URL
//!
//! Upstream response:
//!     → headers.rs (strip hop-by-hop)
//!     → relayed to caller
//! ```
//!
//! # Design Decisions
//! - Connection-scoped headers never cross the proxy
//! - Existing X-Forwarded-For chains are extended, not replaced

pub mod headers;
