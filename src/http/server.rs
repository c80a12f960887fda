//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Mount the discovered route table on an Axum Router
//! - Serve the built-in `/` greeting and the not-found fallback
//! - Wire up middleware (timeouts, body limits)
//! - Bind server to listener and stop on shutdown

use std::future::Future;
use std::time::Duration;

use axum::{
    http::{Method, Uri},
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

use crate::config::ServerConfig;
use crate::http::error::HttpError;
use crate::routing::{AxumRoutes, RouteTable, RouterError};

/// Body of `GET /`.
pub const GREETING: &str = "Hello world!";

/// HTTP server for the discovered routes.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a server serving every route in `routes`.
    pub fn new(config: ServerConfig, routes: &RouteTable) -> Result<Self, RouterError> {
        let mut mounted = AxumRoutes::new();
        routes.install(&mut mounted)?;
        let router = Self::build_router(&config, mounted.into_router());
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, routes: Router) -> Router {
        Router::new()
            .route("/", get(|| async { GREETING }))
            .merge(routes)
            .fallback(not_found)
            .layer(RequestBodyLimitLayer::new(config.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "Server started successfully. Listening on port {}.",
            addr.port()
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    HttpError::not_found(format!("no route for {method} {uri}"))
}
