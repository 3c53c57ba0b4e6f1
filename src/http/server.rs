//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the search and health handlers
//! - Wire up middleware (request ID, tracing)
//! - Own the process-wide base context handed to every request
//! - Serve with connect info so handlers see the remote address
//! - Stop when the shutdown future resolves

use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use url::Url;

use crate::config::{IpPolicy, SearchConfig};
use crate::context::Context;
use crate::http::handler::search_handler;
use crate::http::request::MakeRequestUuidV4;
use crate::runner::CallRunner;
use crate::upstream::SearchClient;

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Read-only ancestor of every request context.
    pub base: Context,
    pub runner: CallRunner,
    pub api: Url,
    pub deadline: Duration,
    pub ip_policy: IpPolicy,
}

/// Errors building the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid upstream url: {0}")]
    UpstreamUrl(#[from] url::ParseError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

/// HTTP server for the search service.
pub struct HttpServer {
    router: Router,
    config: SearchConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: SearchConfig) -> Result<Self, ServerError> {
        let api = Url::parse(&config.upstream.url)?;
        let client = SearchClient::new(&config.upstream, &config.timeouts)?;

        let state = AppState {
            base: Context::background(),
            runner: CallRunner::new(client),
            api,
            deadline: config.timeouts.deadline(),
            ip_policy: config.client_ip.policy,
        };

        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/search", get(search_handler))
            .route("/health", get(health))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// The routing table, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run the server until `shutdown` resolves, then drain connections.
    pub async fn run<S>(self, listener: TcpListener, shutdown: S) -> Result<(), std::io::Error>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            deadline_ms = self.config.timeouts.deadline_ms,
            upstream = %self.config.upstream.url,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown requested, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
