//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the dispatch handler
//! - Wire up middleware (tracing, request ID, request timeout)
//! - Dispatch requests through the closed route table
//! - Count the view, rewrite, and forward badge requests upstream
//! - Serve on a listener until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::schema::{BadgeConfig, TimeoutConfig};
use crate::http::request::{peer_addr, request_id, MakeRequestUuidV4, X_REQUEST_ID};
use crate::http::response::{relay, ProxyError};
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::observability::metrics;
use crate::proxy::director::{forward_copy, Director};
use crate::proxy::{BadgeStyle, Transport, Upstream};
use crate::routing::{Route, RouteTable};
use crate::store::ViewCounter;

/// Application state injected into handlers. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub director: Arc<Director>,
    pub transport: Arc<dyn Transport>,
    pub counter: Arc<dyn ViewCounter>,
    pub badge: Arc<BadgeStyle>,
}

impl AppState {
    pub fn new(
        config: &BadgeConfig,
        upstream: Upstream,
        transport: Arc<dyn Transport>,
        counter: Arc<dyn ViewCounter>,
    ) -> Self {
        Self {
            routes: Arc::new(RouteTable::new()),
            director: Arc::new(Director::new(Arc::new(upstream))),
            transport,
            counter,
            badge: Arc::new(BadgeStyle::from_config(config)),
        }
    }
}

/// HTTP server for the badge front door.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState, timeouts: &TimeoutConfig) -> Self {
        let router = Self::build_router(state, Duration::from_secs(timeouts.request_secs));
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, request_timeout: Duration) -> Router {
        let trace = TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                request_id = %request_id(req.headers()),
            )
        });

        Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(trace)
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections until `shutdown` fires.
    ///
    /// After the signal no new connections are accepted; the future resolves
    /// once in-flight connections have finished.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownSignal) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Single entry point: resolve the route, then serve it.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();

    let route = match state.routes.resolve(&method, request.uri().path()) {
        Ok(route) => route,
        Err(rejection) => {
            tracing::debug!(path = %request.uri().path(), ?rejection, "Request not routed");
            let response = rejection.into_response();
            metrics::record_request("none", &method, response.status().as_u16(), start_time);
            return response;
        }
    };

    let kind = route.kind();
    let response = match route {
        Route::Health => StatusCode::OK.into_response(),
        Route::Badge { service, user } => {
            let outbound = forward_copy(&request, peer_addr(&request));
            match serve_badge(&state, outbound, &service, &user).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(
                        service = %service,
                        user = %user,
                        kind = e.kind(),
                        error = %e,
                        "Badge request failed"
                    );
                    metrics::record_error(e.kind());
                    e.into_response()
                }
            }
        }
    };

    metrics::record_request(kind.name(), &method, response.status().as_u16(), start_time);
    response
}

async fn serve_badge(
    state: &AppState,
    mut outbound: Request<Body>,
    service: &str,
    user: &str,
) -> Result<Response, ProxyError> {
    let count = state.counter.increment(service, user).await?;
    metrics::record_view(if state.badge.is_known(service) { service } else { "other" });

    let badge = state.badge.query(service, count);
    state.director.direct(&mut outbound, Some(&badge))?;

    tracing::debug!(
        service = %service,
        user = %user,
        count,
        upstream = %outbound.uri(),
        "Forwarding badge request"
    );

    let upstream_response = state.transport.execute(outbound).await?;
    Ok(relay(upstream_response))
}
