//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, dispatch)
//!     → [routing decides badge / health / 404 / 405]
//!     → [store counts the view]
//!     → [director rewrites a forwarded copy, transport sends it]
//!     → response.rs (relay upstream response or map the failure)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use response::ProxyError;
pub use server::{AppState, HttpServer};
