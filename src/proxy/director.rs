//! Request rewriting for the badge renderer.
//!
//! The inbound request stays untouched so it remains valid for logging; the
//! director works on a forwarded copy built by [`forward_copy`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{self, HeaderValue};
use axum::http::Request;

use crate::proxy::badge::BadgeQuery;
use crate::proxy::upstream::{Upstream, UpstreamError};
use crate::security::headers::{
    append_forwarded_for, strip_hop_by_hop, X_FORWARDED_HOST, X_ORIGIN_HOST,
};

/// Build the bodiless copy that gets forwarded upstream.
///
/// Method, URI, version and end-to-end headers are carried over; hop-by-hop
/// headers are dropped and the peer is appended to X-Forwarded-For.
pub fn forward_copy<B>(inbound: &Request<B>, peer: Option<SocketAddr>) -> Request<Body> {
    let mut outbound = Request::new(Body::empty());
    *outbound.method_mut() = inbound.method().clone();
    *outbound.uri_mut() = inbound.uri().clone();
    *outbound.version_mut() = inbound.version();
    *outbound.headers_mut() = inbound.headers().clone();

    strip_hop_by_hop(outbound.headers_mut());
    if let Some(peer) = peer {
        append_forwarded_for(outbound.headers_mut(), peer.ip());
    }
    outbound
}

/// Rewrites forwarded requests onto the fixed upstream target.
#[derive(Debug, Clone)]
pub struct Director {
    upstream: Arc<Upstream>,
}

impl Director {
    pub fn new(upstream: Arc<Upstream>) -> Self {
        Self { upstream }
    }

    /// Rewrite `outbound` in place.
    ///
    /// On error `outbound` is left as it was.
    pub fn direct(
        &self,
        outbound: &mut Request<Body>,
        badge: Option<&BadgeQuery>,
    ) -> Result<(), UpstreamError> {
        let query = badge.map(BadgeQuery::encode);
        let uri = self.upstream.uri(query.as_deref())?;

        let original_host = outbound
            .headers()
            .get(header::HOST)
            .cloned()
            .or_else(|| {
                outbound
                    .uri()
                    .authority()
                    .and_then(|a| HeaderValue::from_str(a.as_str()).ok())
            });

        let headers = outbound.headers_mut();
        if let Some(host) = original_host {
            headers.append(X_FORWARDED_HOST, host);
        }
        headers.append(X_ORIGIN_HOST, self.upstream.host().clone());
        headers.append(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        *outbound.uri_mut() = uri;

        outbound
            .headers_mut()
            .insert(header::HOST, self.upstream.host().clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Version};

    fn director() -> Director {
        Director::new(Arc::new(
            Upstream::parse("https://img.shields.io/static/v1").unwrap(),
        ))
    }

    fn inbound() -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri("/stats/github/alice/count.svg?style=flat")
            .header(header::HOST, "badges.example.com")
            .header(header::CONNECTION, "keep-alive")
            .header(header::ACCEPT, "image/svg+xml")
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn copy_leaves_inbound_untouched() {
        let inbound = inbound();
        let peer: SocketAddr = "198.51.100.4:51000".parse().unwrap();

        let outbound = forward_copy(&inbound, Some(peer));

        assert_eq!(inbound.headers()[header::CONNECTION], "keep-alive");
        assert!(outbound.headers().get(header::CONNECTION).is_none());
        assert_eq!(outbound.headers()["x-forwarded-for"], "198.51.100.4");
        assert_eq!(outbound.headers()[header::ACCEPT], "image/svg+xml");
        assert_eq!(outbound.version(), Version::HTTP_11);
    }

    #[test]
    fn rewrites_onto_upstream() {
        let mut outbound = forward_copy(&inbound(), None);

        director().direct(&mut outbound, None).unwrap();

        assert_eq!(outbound.uri().to_string(), "https://img.shields.io/static/v1");
        assert_eq!(outbound.headers()[header::HOST], "img.shields.io");
        assert_eq!(outbound.headers()["x-forwarded-host"], "badges.example.com");
        assert_eq!(outbound.headers()["x-origin-host"], "img.shields.io");
        assert_eq!(outbound.headers()[header::CACHE_CONTROL], "no-cache");
    }

    #[test]
    fn injects_badge_query() {
        let mut outbound = forward_copy(&inbound(), None);
        let badge = BadgeQuery {
            label: "GitHub profile views".to_string(),
            message: "42".to_string(),
            color: "brightgreen".to_string(),
        };

        director().direct(&mut outbound, Some(&badge)).unwrap();

        assert_eq!(outbound.uri().path(), "/static/v1");
        assert_eq!(
            outbound.uri().query(),
            Some("label=GitHub+profile+views&message=42&color=brightgreen")
        );
    }

    #[test]
    fn forwarded_host_falls_back_to_authority() {
        let inbound = Request::builder()
            .uri("http://badges.example.com/stats/github/alice/count.svg")
            .version(Version::HTTP_2)
            .body(Body::empty())
            .unwrap();
        let mut outbound = forward_copy(&inbound, None);

        director().direct(&mut outbound, None).unwrap();

        assert_eq!(outbound.headers()["x-forwarded-host"], "badges.example.com");
    }
}
