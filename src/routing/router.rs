//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Hold the closed set of routes this service answers
//! - Resolve a method and path to a route or an explicit rejection
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Routes are an enum, not a registry of handlers
//! - A path match with the wrong method is 405, never a fallthrough

use axum::http::Method;

use crate::routing::matcher::PathPattern;

/// Every route the dispatcher knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Badge,
    Health,
}

impl RouteKind {
    pub const ALL: [RouteKind; 2] = [RouteKind::Badge, RouteKind::Health];

    pub fn pattern(self) -> &'static str {
        match self {
            RouteKind::Badge => "/stats/{service}/{user}/count.svg",
            RouteKind::Health => "/healthz",
        }
    }

    /// Name used in logs and metric labels.
    pub fn name(self) -> &'static str {
        match self {
            RouteKind::Badge => "badge",
            RouteKind::Health => "health",
        }
    }

    pub fn allows(self, method: &Method) -> bool {
        match self {
            RouteKind::Badge => method == Method::GET,
            RouteKind::Health => method == Method::GET || method == Method::HEAD,
        }
    }

    /// Value of the `Allow` header on a 405.
    pub fn allow_header(self) -> &'static str {
        match self {
            RouteKind::Badge => "GET",
            RouteKind::Health => "GET, HEAD",
        }
    }
}

/// A resolved route with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Badge { service: String, user: String },
    Health,
}

impl Route {
    pub fn kind(&self) -> RouteKind {
        match self {
            Route::Badge { .. } => RouteKind::Badge,
            Route::Health => RouteKind::Health,
        }
    }
}

/// Why a request was not routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    NotFound,
    MethodNotAllowed(RouteKind),
}

/// The compiled, immutable route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<(RouteKind, PathPattern)>,
}

impl RouteTable {
    pub fn new() -> Self {
        let entries = RouteKind::ALL
            .into_iter()
            .map(|kind| (kind, PathPattern::new(kind.pattern())))
            .collect();
        Self { entries }
    }

    pub fn resolve(&self, method: &Method, path: &str) -> Result<Route, RouteError> {
        let (kind, mut params) = self
            .entries
            .iter()
            .find_map(|(kind, pattern)| pattern.captures(path).map(|p| (*kind, p)))
            .ok_or(RouteError::NotFound)?;

        if !kind.allows(method) {
            return Err(RouteError::MethodNotAllowed(kind));
        }

        match kind {
            RouteKind::Badge => {
                let service = params.take("service").ok_or(RouteError::NotFound)?;
                let user = params.take("user").ok_or(RouteError::NotFound)?;
                Ok(Route::Badge { service, user })
            }
            RouteKind::Health => Ok(Route::Health),
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}
