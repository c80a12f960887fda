//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Discovery (at startup):
//!     routes root
//!     → lister.rs (depth-first walk, listing order)
//!     → discovery.rs (routable file filter)
//!     → pattern.rs (file path → /users/:id)
//!     → loader.rs (file → RouteModule exports)
//!     → http::adapter (handler → Endpoint)
//!     → table.rs (collision-checked RouteTable)
//!     → axum_router.rs (mount on axum::Router)
//! ```
//!
//! # Design Decisions
//! - Routes discovered at startup, immutable at runtime
//! - Only verb-named handler exports are routed
//! - Any discovery failure is fatal; no partial tables

pub mod axum_router;
pub mod discovery;
pub mod handler;
pub mod lister;
pub mod loader;
pub mod module;
pub mod pattern;
pub mod table;

pub use axum_router::AxumRoutes;
pub use discovery::{Discoverer, DiscoveryError, DiscoveryOptions};
pub use handler::{handler, BoxedHandler, Handler};
pub use lister::{DirEntry, DirectoryLister, FsLister};
pub use loader::{LoadError, ModuleLoader, ModuleRegistry};
pub use module::RouteModule;
pub use table::{HttpRouter, Route, RouteTable, RouterError};
