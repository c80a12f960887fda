//! Module loading collaborator.
//!
//! Route files cannot be imported at runtime, so the default loader is a
//! registry of compiled [`RouteModule`]s keyed by their file path relative
//! to the routes root. A routable file with nothing registered is an error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::routing::module::RouteModule;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no route module registered for {0}")]
    NotRegistered(String),

    #[error("{path} is outside the routes root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

/// Loads the exports of a route file.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(&self, file: &Path) -> Result<RouteModule, LoadError>;
}

/// Compiled route modules keyed by `/`-separated relative path.
#[derive(Debug, Clone)]
pub struct ModuleRegistry {
    root: PathBuf,
    modules: HashMap<String, RouteModule>,
}

impl ModuleRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            modules: HashMap::new(),
        }
    }

    /// Register `module` as the contents of `relative` (e.g. `users/[id].rs`).
    pub fn with(mut self, relative: impl Into<String>, module: RouteModule) -> Self {
        self.modules.insert(relative.into(), module);
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn key(&self, file: &Path) -> Result<String, LoadError> {
        let relative = file.strip_prefix(&self.root).map_err(|_| LoadError::OutsideRoot {
            path: file.to_path_buf(),
            root: self.root.clone(),
        })?;
        Ok(relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"))
    }
}

#[async_trait]
impl ModuleLoader for ModuleRegistry {
    async fn load(&self, file: &Path) -> Result<RouteModule, LoadError> {
        let key = self.key(file)?;
        self.modules
            .get(&key)
            .cloned()
            .ok_or(LoadError::NotRegistered(key))
    }
}
