//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use view_badge_proxy::config::schema::BadgeConfig;
use view_badge_proxy::error::StoreError;
use view_badge_proxy::store::{ResourcePool, ViewCounter};

/// What the mock renderer answers with.
#[derive(Debug, Clone, Copy)]
pub struct MockReply {
    pub status: u16,
    pub body: &'static str,
    pub delay: Duration,
}

impl MockReply {
    pub fn svg(body: &'static str) -> Self {
        Self {
            status: 200,
            body,
            delay: Duration::ZERO,
        }
    }
}

/// Start a mock renderer on an ephemeral port.
///
/// Every request head (request line plus headers, lowercased) is sent on the
/// returned channel before the reply is written.
pub async fn start_mock_upstream(reply: MockReply) -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let mut head = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => head.extend_from_slice(&buf[..n]),
                            }
                        }
                        let _ = tx.send(String::from_utf8_lossy(&head).to_lowercase());

                        tokio::time::sleep(reply.delay).await;
                        let status_text = match reply.status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: image/svg+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            reply.body.len(),
                            reply.body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, rx)
}

/// In-memory view store that counts closes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    views: Arc<Mutex<HashMap<(String, String), i64>>>,
    pub closes: Arc<AtomicUsize>,
}

impl MemoryStore {
    #[allow(dead_code)]
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl ViewCounter for MemoryStore {
    fn increment<'a>(&'a self, service: &'a str, user: &'a str) -> BoxFuture<'a, Result<i64, StoreError>> {
        Box::pin(async move {
            let mut views = self.views.lock().unwrap();
            let count = views.entry((service.to_string(), user.to_string())).or_insert(0);
            *count += 1;
            Ok(*count)
        })
    }
}

impl ResourcePool for MemoryStore {
    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.closes.fetch_add(1, Ordering::SeqCst);
        })
    }
}

/// Config pointing at `upstream`, listening on an ephemeral local port.
pub fn test_config(upstream: SocketAddr) -> BadgeConfig {
    let mut config = BadgeConfig::default();
    config.listener.host = "127.0.0.1".to_string();
    config.listener.port = 0;
    config.database.url = "postgres://localhost/views".to_string();
    config.upstream.url = format!("http://{}/static/v1", upstream);
    config.services.insert("github".to_string(), "GitHub".to_string());
    config
}

/// A port nothing is listening on.
#[allow(dead_code)]
pub fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
