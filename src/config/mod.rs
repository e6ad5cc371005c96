//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → cli.rs (flags and environment layered on top)
//!     → validation.rs (semantic checks)
//!     → BadgeConfig (validated, immutable)
//!     → passed explicitly to startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Args;
pub use schema::BadgeConfig;
pub use schema::ListenerConfig;
pub use schema::UpstreamConfig;
