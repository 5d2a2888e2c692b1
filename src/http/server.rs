//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit, CORS)
//! - Bind server to listener and drain on shutdown

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Request},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Span;

use crate::config::{CorsConfig, ServiceConfig};
use crate::history::HistoryStore;
use crate::http::{health, history, proxy};
use crate::lifecycle::shutdown;
use crate::relay::{Relay, RelayError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Relay,
    pub history: HistoryStore,
    /// Deadline for one relayed call, answered with a failure envelope.
    pub relay_deadline: Duration,
}

impl AppState {
    /// Build state from configuration: a fresh relay client and an empty store.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, RelayError> {
        Ok(Self {
            relay: Relay::new(&config.relay)?,
            history: HistoryStore::with_capacity(config.history.capacity),
            relay_deadline: Duration::from_secs(config.timeouts.request_secs),
        })
    }
}

/// HTTP server exposing the relay and history store.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> Result<Self, RelayError> {
        let state = AppState::from_config(&config)?;
        Ok(Self::with_state(config, state))
    }

    /// Create a server around existing state.
    pub fn with_state(config: ServiceConfig, state: AppState) -> Self {
        let router = build_router(&config, state.clone());
        Self {
            router,
            state,
            config,
        }
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            history_capacity = self.state.history.capacity(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait_for(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

/// Headroom between the relay deadline and the router-wide timeout, so an
/// expired relay call still produces its envelope.
const RESPONSE_GRACE: Duration = Duration::from_secs(5);

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &ServiceConfig, state: AppState) -> Router {
    let router = Router::new()
        .route("/proxy/send", post(proxy::send))
        .route(
            "/history",
            get(history::list).post(history::add).delete(history::clear),
        )
        .route(
            "/history/{id}",
            get(history::get).delete(history::delete),
        )
        .route("/health", get(health::health))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(
                    Duration::from_secs(config.timeouts.request_secs) + RESPONSE_GRACE,
                )),
        );

    if config.cors.enabled {
        router.layer(cors_layer(&config.cors))
    } else {
        router
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins = if config.allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
