//! Application route files.
//!
//! Each file under this directory is one route; its path relative to this
//! directory is its URL (`locations/[id].rs` serves `/locations/:id`).
//! Discovery walks the directory, and [`registry`] supplies the compiled
//! module behind every routable file.

use std::path::PathBuf;
use std::sync::Arc;

use crate::db::LocationStore;
use crate::routing::ModuleRegistry;

pub mod locations;
#[path = "locations/[id].rs"]
pub mod location_by_id;

/// Shared services handed to route modules.
#[derive(Clone)]
pub struct RouteServices {
    pub locations: Arc<dyn LocationStore>,
}

/// The directory these route files live in.
pub fn default_root() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/src/routes"))
}

/// Register every route module under `root`.
pub fn registry(root: impl Into<PathBuf>, services: &RouteServices) -> ModuleRegistry {
    ModuleRegistry::new(root)
        .with("locations.rs", locations::module(services))
        .with("locations/[id].rs", location_by_id::module(services))
}
