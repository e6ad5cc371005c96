//! Profile view badge front door library

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;
pub mod security;
pub mod store;

pub use config::schema::BadgeConfig;
pub use http::HttpServer;
pub use lifecycle::{launch, Coordinator, Shutdown};
