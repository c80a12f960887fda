//! Startup orchestration.
//!
//! # Responsibilities
//! - Open storage and build the services route modules depend on
//! - Discover the route table from the routes directory
//! - Build the HTTP server and bind its listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener binds last (traffic only when ready)

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{AppConfig, DatabaseConfig};
use crate::db::{Database, SqliteLocations, StoreError};
use crate::http::{DefaultFallback, HttpServer, RequestAdapter};
use crate::lifecycle::Shutdown;
use crate::observability::Palette;
use crate::routes::{self, RouteServices};
use crate::routing::{Discoverer, DiscoveryError, FsLister, RouteTable, RouterError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to prepare location store: {0}")]
    Store(#[from] StoreError),

    #[error("route discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("failed to mount routes: {0}")]
    Router(#[from] RouterError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Open the database and wrap it in the services route modules use.
pub async fn connect_services(
    config: &DatabaseConfig,
    palette: &Palette,
) -> Result<RouteServices, StartupError> {
    let db = Database::connect(config, palette).await?;
    let locations = SqliteLocations::new(db, config.table.clone());
    locations.ensure_schema().await?;
    Ok(RouteServices {
        locations: Arc::new(locations),
    })
}

/// Discover every route under `root`.
pub async fn discover_routes(
    root: &Path,
    services: &RouteServices,
    palette: &Palette,
) -> Result<RouteTable, StartupError> {
    let adapter = RequestAdapter::new(
        palette.factory("request"),
        Arc::new(DefaultFallback::new(palette.component("errors"))),
    );
    let discoverer = Discoverer::new(
        FsLister,
        routes::registry(root, services),
        adapter,
        palette.component("routing"),
    );
    Ok(discoverer.discover(root).await?)
}

/// A discovered, mounted application ready to serve.
pub struct Application {
    server: HttpServer,
    routes: RouteTable,
}

impl Application {
    /// Discover routes and build the server; nothing is bound yet.
    pub async fn create(
        config: &AppConfig,
        services: &RouteServices,
        palette: &Palette,
    ) -> Result<Self, StartupError> {
        let routes = discover_routes(&config.routes.directory, services, palette).await?;
        let server = HttpServer::new(config.server.clone(), &routes)?;
        tracing::info!(routes = routes.len(), "Application created");
        Ok(Self { server, routes })
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// The layered router, for in-process requests.
    pub fn router(&self) -> Router {
        self.server.router()
    }

    /// Bind the configured address and serve until `shutdown` fires.
    pub async fn start(self, shutdown: &Shutdown) -> Result<(), StartupError> {
        let address = self.server.config().socket_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| StartupError::Bind { address, source })?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), StartupError> {
        self.server
            .run(listener, shutdown.signalled())
            .await
            .map_err(StartupError::Serve)
    }
}
