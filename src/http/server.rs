//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum app with a single catch-all handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Dispatch requests to the PathRouter
//! - Forward routed requests upstream or serve the fallback page
//! - Apply reloaded mapping tables
//! - Stop on the shutdown broadcast

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{MappingTable, ProxyConfig};
use crate::http::fallback::FallbackPage;
use crate::http::forward::{ForwardError, Forwarder};
use crate::http::request::{assign_request_id, RequestIdExt};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::routing::{PathRouter, RouteDecision};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Forwarder(#[from] ForwardError),

    #[error("failed to read fallback page: {0}")]
    FallbackPage(#[source] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ArcSwap<PathRouter>>,
    pub forwarder: Forwarder,
    pub fallback: Arc<FallbackPage>,
}

/// HTTP server for the router.
pub struct HttpServer {
    app: Router,
    router: Arc<ArcSwap<PathRouter>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let router = Arc::new(ArcSwap::from_pointee(PathRouter::new(&config.mappings)));
        let forwarder = Forwarder::new(&config.upstream, &config.timeouts)?;
        let fallback = FallbackPage::load(config.fallback.page_path.as_deref())
            .map_err(ServerError::FallbackPage)?;

        let state = AppState {
            router: Arc::clone(&router),
            forwarder,
            fallback: Arc::new(fallback),
        };

        let app = Self::build_router(&config, state);
        Ok(Self { app, router })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// A request outliving `request_secs` gets 504: the wait is on the upstream.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .fallback(route_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn(assign_request_id))
                    .layer(TraceLayer::new_for_http().make_span_with(make_span))
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::GATEWAY_TIMEOUT,
                        Duration::from_secs(config.timeouts.request_secs),
                    )),
            )
    }

    /// The Axum app, for serving on a custom transport or driving in tests.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// Number of prefix mappings currently in effect.
    pub fn route_count(&self) -> usize {
        self.router.load().len()
    }

    /// Run the server until `shutdown_rx` fires.
    ///
    /// Tables received on `mapping_updates` replace the one in service.
    /// Other settings only take effect on restart.
    pub async fn run(
        self,
        listener: TcpListener,
        mut mapping_updates: mpsc::UnboundedReceiver<MappingTable>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.route_count(),
            "HTTP server starting"
        );

        let router = Arc::clone(&self.router);
        let reload = tokio::spawn(async move {
            while let Some(table) = mapping_updates.recv().await {
                apply_mappings(&router, &table);
            }
        });

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        reload.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Swap in a router compiled from `table`.
pub fn apply_mappings(router: &ArcSwap<PathRouter>, table: &MappingTable) {
    let compiled = PathRouter::new(table);
    tracing::info!(routes = compiled.len(), "Mapping table reloaded");
    router.store(Arc::new(compiled));
}

fn make_span(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .request_id()
        .map(ToString::to_string)
        .unwrap_or_default();
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

/// Catch-all handler: route, then forward or serve the fallback page.
async fn route_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let decision = state.router.load().route(request);

    match decision {
        RouteDecision::ServeFallback => {
            tracing::debug!(path = %path, "Serving fallback page");
            metrics::record_request(&method, StatusCode::OK.as_u16(), metrics::DECISION_FALLBACK, start);
            state.fallback.response()
        }
        RouteDecision::Forward(outbound) => {
            let target = outbound.url.clone();
            tracing::debug!(path = %path, target = %target, "Forwarding request");

            match state.forwarder.forward(outbound).await {
                Ok(response) => {
                    metrics::record_request(&method, response.status().as_u16(), metrics::DECISION_FORWARD, start);
                    response
                }
                Err(e) => {
                    tracing::warn!(target = %target, error = %e, "Upstream request failed");
                    metrics::record_request(
                        &method,
                        StatusCode::BAD_GATEWAY.as_u16(),
                        metrics::DECISION_UPSTREAM_ERROR,
                        start,
                    );
                    (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
                }
            }
        }
    }
}
