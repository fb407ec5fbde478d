//! Thread-safe handle on an application instance

use crate::app::AppInstance;
use crate::resolver::ModuleMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::trace;

/// Shares one [`AppInstance`] between threads.
///
/// Declarations, context changes and cache recomputation all happen under the
/// write lock. Queries are answered under the read lock while the cache they
/// need is populated.
#[derive(Debug, Clone)]
pub struct SharedApp {
    inner: Arc<RwLock<AppInstance>>,
}

impl SharedApp {
    /// Wrap `app` for sharing
    pub fn new(app: AppInstance) -> Self {
        Self {
            inner: Arc::new(RwLock::new(app)),
        }
    }

    /// Shared access for lookups
    pub fn read(&self) -> RwLockReadGuard<'_, AppInstance> {
        self.inner.read()
    }

    /// Exclusive access for declarations and context changes
    pub fn write(&self) -> RwLockWriteGuard<'_, AppInstance> {
        self.inner.write()
    }

    /// See [`AppInstance::all_modules_path`]
    pub fn all_modules_path(&self) -> ModuleMap {
        if let Some(modules) = self.inner.read().cached_modules_path() {
            trace!("Module map served from cache");
            return modules.clone();
        }
        self.inner.write().all_modules_path().clone()
    }

    /// See [`AppInstance::all_plugins_path`]
    pub fn all_plugins_path(&self) -> Vec<PathBuf> {
        if let Some(plugins) = self.inner.read().cached_plugins_path() {
            trace!("Plugin directories served from cache");
            return plugins.to_vec();
        }
        self.inner.write().all_plugins_path().to_vec()
    }
}
