//! Jelix module and plugin resolution
//!
//! This crate turns declared directories into the module and plugin locations
//! of an application:
//! - Module declarations (single modules, whole directories, name lists)
//! - Lazy, cached resolution of module names and plugin directories
//! - Enabled-module lookups and plugin instantiation from the configuration
//! - A save/restore stack over the whole resolution state

pub mod app;
pub mod config;
pub mod context;
pub mod error;
pub mod module_stack;
pub mod paths;
pub mod plugin;
pub mod registry;
pub mod resolver;
pub mod shared;

pub use app::AppInstance;
pub use config::AppConfig;
pub use context::{ContextStack, ResolutionState, Snapshot};
pub use error::{CoreError, Result};
pub use module_stack::ModuleContextStack;
pub use paths::AppPaths;
pub use plugin::{PluginArg, PluginFactory, PluginRegistry};
pub use registry::{ModuleFilter, PathRegistry};
pub use resolver::{BundledLocations, Cached, ModuleMap, ResolvedIndex, Resolver, ResolverStats, CORE_MODULE};
pub use shared::SharedApp;
