//! Outbound transport to the badge renderer.
//!
//! # Responsibilities
//! - Keep a warm connection pool to one upstream host
//! - Cap concurrent upstream connections per host
//! - Stream the upstream response back without buffering
//!
//! # Design Decisions
//! - One attempt per inbound request, no retries
//! - Redirects are relayed to the caller, never followed
//! - The request timeout covers the whole exchange, body included
//! - The connection slot is held until the response body is read or fails

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use tokio::sync::Semaphore;

use crate::config::UpstreamConfig;
use crate::error::TransportError;

/// Executes a rewritten request against the upstream.
pub trait Transport: Send + Sync + 'static {
    fn execute(&self, request: Request<Body>) -> BoxFuture<'_, Result<Response<Body>, TransportError>>;
}

/// Connection pool tuning, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSettings {
    pub max_idle_per_host: usize,
    pub max_conns_per_host: usize,
    pub idle_timeout: Duration,
    pub request_timeout: Duration,
}

impl From<&UpstreamConfig> for TransportSettings {
    fn from(config: &UpstreamConfig) -> Self {
        Self {
            max_idle_per_host: config.max_idle_per_host,
            max_conns_per_host: config.max_conns_per_host,
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self::from(&UpstreamConfig::default())
    }
}

/// Pooled HTTP client for the renderer host.
#[derive(Debug, Clone)]
pub struct PooledTransport {
    client: reqwest::Client,
    slots: Arc<Semaphore>,
    settings: TransportSettings,
}

impl PooledTransport {
    pub fn new(settings: TransportSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(settings.max_idle_per_host)
            .pool_idle_timeout(settings.idle_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()
            .map_err(TransportError::Build)?;

        tracing::debug!(
            max_idle_per_host = settings.max_idle_per_host,
            max_conns_per_host = settings.max_conns_per_host,
            idle_timeout_secs = settings.idle_timeout.as_secs(),
            "Upstream transport ready"
        );

        Ok(Self {
            client,
            slots: Arc::new(Semaphore::new(settings.max_conns_per_host)),
            settings,
        })
    }

    /// Connection slots not currently in use.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }
}

impl Transport for PooledTransport {
    fn execute(&self, request: Request<Body>) -> BoxFuture<'_, Result<Response<Body>, TransportError>> {
        Box::pin(async move {
            // Waits when every slot is taken.
            let slot = self
                .slots
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| TransportError::Closed)?;

            let (parts, _body) = request.into_parts();
            let pending = self
                .client
                .request(parts.method, parts.uri.to_string())
                .headers(parts.headers)
                .send();

            let response = pending.await.map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(self.settings.request_timeout)
                } else {
                    TransportError::Request(e)
                }
            })?;

            let response: Response<reqwest::Body> = response.into();
            let (parts, body) = response.into_parts();
            let stream = Body::new(body).into_data_stream().map(move |chunk| {
                let _held = &slot;
                chunk
            });

            Ok(Response::from_parts(parts, Body::from_stream(stream)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Renderer that writes `reply` after the request head, then keeps the
    /// socket open for `hold`.
    async fn raw_renderer(reply: &'static str, hold: Duration) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut head = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => head.extend_from_slice(&buf[..n]),
                        }
                    }
                    let _ = socket.write_all(reply.as_bytes()).await;
                    tokio::time::sleep(hold).await;
                });
            }
        });
        addr
    }

    fn single_slot(request_timeout: Duration) -> PooledTransport {
        PooledTransport::new(TransportSettings {
            max_conns_per_host: 1,
            request_timeout,
            ..TransportSettings::default()
        })
        .unwrap()
    }

    fn get(addr: SocketAddr) -> Request<Body> {
        Request::builder()
            .uri(format!("http://{}/static/v1", addr))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn settings_follow_config() {
        let settings = TransportSettings::default();
        assert_eq!(settings.max_idle_per_host, 20);
        assert_eq!(settings.max_conns_per_host, 20);
        assert_eq!(settings.idle_timeout, Duration::from_secs(12 * 60 * 60));
    }

    #[tokio::test]
    async fn refused_connection_is_request_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = PooledTransport::new(TransportSettings::default()).unwrap();
        let request = Request::builder()
            .uri(format!("http://{}/static/v1", addr))
            .body(Body::empty())
            .unwrap();

        let result = transport.execute(request).await;
        assert!(matches!(result, Err(TransportError::Request(_))));
        assert_eq!(transport.available_slots(), 20);
    }

    #[tokio::test]
    async fn stalled_body_times_out_and_frees_slot() {
        let addr = raw_renderer(
            "HTTP/1.1 200 OK\r\nContent-Type: image/svg+xml\r\nContent-Length: 100\r\n\r\n<svg>",
            Duration::from_secs(30),
        )
        .await;
        let transport = single_slot(Duration::from_secs(1));

        let response = transport.execute(get(addr)).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(transport.available_slots(), 0);

        let body = tokio::time::timeout(
            Duration::from_secs(5),
            axum::body::to_bytes(response.into_body(), usize::MAX),
        )
        .await
        .expect("body read must be cut off by the request timeout");
        assert!(body.is_err());
        assert_eq!(transport.available_slots(), 1);
    }

    #[tokio::test]
    async fn slow_headers_are_a_timeout() {
        let addr = raw_renderer("", Duration::from_secs(30)).await;
        let transport = single_slot(Duration::from_secs(1));

        let result = transport.execute(get(addr)).await;

        assert!(matches!(result, Err(TransportError::Timeout(_))));
        assert_eq!(transport.available_slots(), 1);
    }

    #[tokio::test]
    async fn extra_requests_wait_for_a_slot() {
        let addr = raw_renderer(
            "HTTP/1.1 200 OK\r\nContent-Length: 6\r\nConnection: close\r\n\r\n<svg/>",
            Duration::ZERO,
        )
        .await;
        let transport = single_slot(Duration::from_secs(5));

        let first = transport.execute(get(addr)).await.unwrap();
        assert_eq!(transport.available_slots(), 0);

        let waiting = tokio::time::timeout(Duration::from_millis(300), transport.execute(get(addr))).await;
        assert!(waiting.is_err(), "second request must wait while the first holds the slot");

        let body = axum::body::to_bytes(first.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<svg/>");

        let second = tokio::time::timeout(Duration::from_secs(5), transport.execute(get(addr)))
            .await
            .expect("slot should be free once the first body is read")
            .unwrap();
        assert_eq!(second.status(), 200);
    }
}
