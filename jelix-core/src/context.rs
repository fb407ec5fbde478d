//! Saving and restoring the whole resolution state
//!
//! A [`Snapshot`] owns an independent copy of every piece of state a query can
//! observe: declarations, computed caches, the current-module stack, the
//! configuration and the application paths. None of these hold shared
//! pointers, so a snapshot and the live state can never alias each other.

use crate::config::AppConfig;
use crate::module_stack::ModuleContextStack;
use crate::paths::AppPaths;
use crate::registry::PathRegistry;
use crate::resolver::Resolver;
use crate::{CoreError, Result};
use once_cell::sync::OnceCell;
use tracing::debug;

/// The live state of an application instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionState {
    /// Declared directories
    pub registry: PathRegistry,
    /// Bundled locations and resolution caches
    pub resolver: Resolver,
    /// Current-module stack
    pub modules: ModuleContextStack,
    /// Configuration of the running entry point
    pub config: Option<AppConfig>,
    /// Application directory layout
    pub paths: AppPaths,
    /// Application version, read once
    pub version: OnceCell<String>,
}

impl ResolutionState {
    /// Fresh state with no declaration and empty caches
    pub fn new(paths: AppPaths, resolver: Resolver) -> Self {
        Self {
            registry: PathRegistry::new(),
            resolver,
            modules: ModuleContextStack::new(),
            config: None,
            paths,
            version: OnceCell::new(),
        }
    }
}

/// A frozen copy of a [`ResolutionState`]
#[derive(Debug)]
pub struct Snapshot {
    state: ResolutionState,
}

impl Snapshot {
    /// Deep-copy the given state
    pub fn capture(state: &ResolutionState) -> Self {
        Self {
            state: ResolutionState {
                registry: state.registry.clone(),
                resolver: state.resolver.clone(),
                modules: state.modules.clone(),
                config: state.config.clone(),
                paths: state.paths.clone(),
                version: state.version.clone(),
            },
        }
    }

    /// Give back the captured state
    pub fn into_state(self) -> ResolutionState {
        self.state
    }
}

/// LIFO of saved snapshots
#[derive(Debug, Default)]
pub struct ContextStack {
    snapshots: Vec<Snapshot>,
}

impl ContextStack {
    /// Create a stack with no saved snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a copy of `state`
    pub fn save(&mut self, state: &ResolutionState) {
        self.snapshots.push(Snapshot::capture(state));
        debug!("Saved context (depth {})", self.snapshots.len());
    }

    /// Pop the most recent snapshot
    pub fn restore(&mut self) -> Result<ResolutionState> {
        let snapshot = self.snapshots.pop().ok_or(CoreError::EmptyContextStack)?;
        debug!("Restored context (depth {})", self.snapshots.len());
        Ok(snapshot.into_state())
    }

    /// Number of snapshots waiting to be restored
    pub fn depth(&self) -> usize {
        self.snapshots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::BundledLocations;

    fn state() -> ResolutionState {
        ResolutionState::new(
            AppPaths::new("/srv/app"),
            Resolver::new(BundledLocations::new("/srv/lib/core-modules/jelix", "/srv/lib/plugins")),
        )
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut live = state();
        live.modules.push("news");
        let snapshot = Snapshot::capture(&live);

        live.modules.push("blog");
        live.config = Some(AppConfig::default());

        let restored = snapshot.into_state();
        assert_eq!(restored.modules.current(), Some("news"));
        assert!(restored.config.is_none());
    }

    #[test]
    fn test_restore_follows_stack_order() {
        let mut stack = ContextStack::new();
        let mut live = state();

        live.modules.push("first");
        stack.save(&live);
        live.modules.push("second");
        stack.save(&live);
        assert_eq!(stack.depth(), 2);

        assert_eq!(stack.restore().unwrap().modules.current(), Some("second"));
        assert_eq!(stack.restore().unwrap().modules.current(), Some("first"));
        assert!(matches!(stack.restore(), Err(CoreError::EmptyContextStack)));
    }
}
