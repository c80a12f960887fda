//! Waypoint: a location search service with file-based routing.
//!
//! # Architecture Overview
//!
//! ```text
//!     routes dir ──▶ routing::discovery ──▶ RouteTable ──▶ http::server (axum)
//!                         │                                     │
//!                    routes::registry                           ▼
//!                    (compiled modules)              http::adapter (per request)
//!                                                               │
//!                                                               ▼
//!                                                   route handler ──▶ db (sqlx)
//! ```
//!
//! Cross-cutting: `config` (TOML + env), `observability` (tracing),
//! `lifecycle` (startup, signals, graceful shutdown).

// Core subsystems
pub mod config;
pub mod db;
pub mod http;
pub mod routes;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{Application, Shutdown};
