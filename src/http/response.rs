//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay the upstream response to the caller
//! - Map routing and upstream failures to HTTP status codes
//!
//! # Design Decisions
//! - Streaming responses avoid buffering the badge body
//! - Hop-by-hop headers stripped before relaying
//! - Upstream timeouts result in 504 Gateway Timeout, other failures in 502

use axum::body::Body;
use axum::http::{header, Response as HttpResponse, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::{StoreError, TransportError};
use crate::proxy::upstream::UpstreamError;
use crate::routing::RouteError;
use crate::security::headers::strip_hop_by_hop;

/// Relay an upstream response, dropping connection-scoped headers.
pub fn relay(upstream: HttpResponse<Body>) -> Response {
    let (mut parts, body) = upstream.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, body)
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        match self {
            RouteError::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
            RouteError::MethodNotAllowed(kind) => (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, kind.allow_header())],
                "Method Not Allowed",
            )
                .into_response(),
        }
    }
}

/// Failures while serving a badge.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("view count unavailable: {0}")]
    Count(#[from] StoreError),

    #[error("upstream request could not be built: {0}")]
    Rewrite(#[from] UpstreamError),

    #[error(transparent)]
    Upstream(#[from] TransportError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Count(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::Rewrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Upstream(TransportError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Count(_) => "count",
            ProxyError::Rewrite(_) => "rewrite",
            ProxyError::Upstream(TransportError::Timeout(_)) => "timeout",
            ProxyError::Upstream(_) => "network",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ProxyError::Count(_) => "View count unavailable",
            ProxyError::Rewrite(_) => "Badge request could not be built",
            ProxyError::Upstream(TransportError::Timeout(_)) => "Upstream timed out",
            ProxyError::Upstream(_) => "Upstream request failed",
        };
        (status, message).into_response()
    }
}
