//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route table lookup)
//!     → matcher.rs (segment-wise pattern match)
//!     → Return: Route, NotFound, or MethodNotAllowed
//!
//! Route Compilation (at startup):
//!     RouteKind::ALL
//!     → Compile patterns
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Closed set of routes; adding one means adding an enum variant
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod router;

pub use router::{Route, RouteError, RouteKind, RouteTable};
