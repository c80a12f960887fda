//! File-based route discovery.
//!
//! # Responsibilities
//! - Walk the routes root depth-first, in listing order
//! - Skip files that are not routable (wrong extension, tests, module glue)
//! - Turn each file path into a URL pattern
//! - Load each module and register its verb-named handlers
//!
//! # Design Decisions
//! - Listing, loading and adapting are injected collaborators
//! - Any failure aborts discovery; callers never see a partial table
//! - Same method + pattern from two files is a startup error

use std::path::{Path, PathBuf};

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::http::adapter::RequestAdapter;
use crate::observability::ComponentLogger;
use crate::routing::lister::DirectoryLister;
use crate::routing::loader::{LoadError, ModuleLoader};
use crate::routing::pattern::file_to_pattern;
use crate::routing::table::{HttpRouter, RouteTable, RouterError};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to list {path}: {source}")]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    #[error(transparent)]
    Router(#[from] RouterError),
}

/// Which files count as route files.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Routable source extension, without the dot.
    pub extension: String,
    /// File name suffixes marking test files.
    pub test_suffixes: Vec<String>,
    /// Exact file names that are never routes.
    pub ignored_names: Vec<String>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            extension: "rs".to_string(),
            test_suffixes: vec![".test.rs".to_string(), "_test.rs".to_string()],
            ignored_names: vec!["mod.rs".to_string()],
        }
    }
}

impl DiscoveryOptions {
    pub fn is_routable(&self, file: &Path) -> bool {
        let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if file.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
            return false;
        }
        if self.test_suffixes.iter().any(|suffix| name.ends_with(suffix.as_str())) {
            return false;
        }
        !self.ignored_names.iter().any(|ignored| ignored == name)
    }
}

/// Builds a [`RouteTable`] from a directory of route files.
pub struct Discoverer<L, M> {
    lister: L,
    loader: M,
    adapter: RequestAdapter,
    options: DiscoveryOptions,
    logger: ComponentLogger,
}

impl<L, M> Discoverer<L, M>
where
    L: DirectoryLister,
    M: ModuleLoader,
{
    pub fn new(lister: L, loader: M, adapter: RequestAdapter, logger: ComponentLogger) -> Self {
        Self {
            lister,
            loader,
            adapter,
            options: DiscoveryOptions::default(),
            logger,
        }
    }

    pub fn with_options(mut self, options: DiscoveryOptions) -> Self {
        self.options = options;
        self
    }

    /// Discover every route under `root`.
    pub async fn discover(&self, root: &Path) -> Result<RouteTable, DiscoveryError> {
        tracing::debug!(
            parent: self.logger.span(),
            "Creating a file-based router using root: {}",
            root.display()
        );

        let mut files = Vec::new();
        self.walk(root.to_path_buf(), &mut files).await?;

        let mut table = RouteTable::new();
        for file in files {
            if !self.options.is_routable(&file) {
                continue;
            }
            let relative = file.strip_prefix(root).unwrap_or(file.as_path());
            let pattern = file_to_pattern(relative, &self.options.extension);

            let module = self
                .loader
                .load(&file)
                .await
                .map_err(|source| DiscoveryError::Load {
                    path: file.clone(),
                    source,
                })?;

            for (name, method, handler) in module.handlers() {
                let source = format!("{}:{}()", file.display(), name);
                let endpoint = self.adapter.adapt(handler.clone(), source);
                table.register(method, &pattern, endpoint)?;
                tracing::trace!(parent: self.logger.span(), "Initialised route: {name} {pattern}");
            }
        }

        tracing::debug!(parent: self.logger.span(), routes = table.len(), "Discovery complete");
        Ok(table)
    }

    /// Discover routes and install them on `router`.
    ///
    /// Nothing is registered unless discovery succeeds as a whole.
    pub async fn discover_into<R: HttpRouter>(
        &self,
        root: &Path,
        router: &mut R,
    ) -> Result<RouteTable, DiscoveryError> {
        let table = self.discover(root).await?;
        table.install(router)?;
        Ok(table)
    }

    fn walk<'a>(
        &'a self,
        directory: PathBuf,
        files: &'a mut Vec<PathBuf>,
    ) -> BoxFuture<'a, Result<(), DiscoveryError>> {
        Box::pin(async move {
            let entries =
                self.lister
                    .list(&directory)
                    .await
                    .map_err(|source| DiscoveryError::Listing {
                        path: directory.clone(),
                        source,
                    })?;

            for entry in entries {
                let path = directory.join(&entry.name);
                if entry.is_dir {
                    self.walk(path, files).await?;
                } else {
                    files.push(path);
                }
            }
            Ok(())
        })
    }
}
