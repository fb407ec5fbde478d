//! Lazy resolution of module names and plugin directories

use crate::paths::{base_name, child_dir, subdirectory_names, with_trailing_separator};
use crate::registry::{ModuleFilter, PathRegistry};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Name of the bundled core pseudo-module
pub const CORE_MODULE: &str = "jelix";

/// Module name to module directory, in resolution order
pub type ModuleMap = IndexMap<String, PathBuf>;

/// A derived value that is either absent or computed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cached<T>(Option<T>);

impl<T> Cached<T> {
    /// An absent cache
    pub fn absent() -> Self {
        Cached(None)
    }

    /// The cached value, if computed
    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    /// Whether a value is cached
    pub fn is_populated(&self) -> bool {
        self.0.is_some()
    }

    /// Drop the cached value
    pub fn invalidate(&mut self) {
        self.0 = None;
    }

    /// Return the cached value, computing it first if absent
    pub fn get_or_compute(&mut self, compute: impl FnOnce() -> T) -> &T {
        self.0.get_or_insert_with(compute)
    }
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Self::absent()
    }
}

/// Locations shipped with the framework itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledLocations {
    /// Directory of the core pseudo-module
    pub core_module: PathBuf,
    /// Directory of the bundled plugins
    pub plugins: PathBuf,
}

impl BundledLocations {
    /// Use the given directories as they are, with a trailing separator
    pub fn new(core_module: impl AsRef<Path>, plugins: impl AsRef<Path>) -> Self {
        Self {
            core_module: normalize_bundled(core_module.as_ref()),
            plugins: normalize_bundled(plugins.as_ref()),
        }
    }

    /// Derive the locations from a framework library directory, which holds
    /// `core-modules/jelix/` and `plugins/`
    pub fn from_lib_path(lib: impl AsRef<Path>) -> Self {
        let lib = lib.as_ref();
        Self::new(lib.join("core-modules").join(CORE_MODULE), lib.join("plugins"))
    }
}

fn normalize_bundled(path: &Path) -> PathBuf {
    let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    with_trailing_separator(&path)
}

/// Cached results of the last resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedIndex {
    /// Module name to directory
    pub modules: Cached<ModuleMap>,
    /// Plugin directories, first match wins
    pub plugins: Cached<Vec<PathBuf>>,
}

/// How many times each cache was recomputed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Module map computations
    pub module_scans: u64,
    /// Plugin list computations
    pub plugin_scans: u64,
}

/// Computes module and plugin locations from a [`PathRegistry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolver {
    bundled: BundledLocations,
    index: ResolvedIndex,
    stats: ResolverStats,
}

impl Resolver {
    /// Create a resolver with empty caches
    pub fn new(bundled: BundledLocations) -> Self {
        Self {
            bundled,
            index: ResolvedIndex::default(),
            stats: ResolverStats::default(),
        }
    }

    /// Framework locations applied on every resolution
    pub fn bundled(&self) -> &BundledLocations {
        &self.bundled
    }

    /// Current cache content
    pub fn index(&self) -> &ResolvedIndex {
        &self.index
    }

    /// Recomputation counters
    pub fn stats(&self) -> ResolverStats {
        self.stats
    }

    /// Drop both caches, after a module declaration
    pub fn invalidate(&mut self) {
        self.index.modules.invalidate();
        self.index.plugins.invalidate();
    }

    /// Drop the plugin cache only, after a plugin declaration
    pub fn invalidate_plugins(&mut self) {
        self.index.plugins.invalidate();
    }

    /// All known modules, including the core pseudo-module
    pub fn all_modules_path(&mut self, registry: &PathRegistry) -> &ModuleMap {
        let Self { bundled, index, stats } = self;
        index.modules.get_or_compute(|| {
            stats.module_scans += 1;
            resolve_modules(bundled, registry)
        })
    }

    /// All directories that may contain plugins, in lookup order
    pub fn all_plugins_path(&mut self, registry: &PathRegistry) -> &[PathBuf] {
        let Self { bundled, index, stats } = self;
        let ResolvedIndex { modules, plugins } = index;
        plugins
            .get_or_compute(|| {
                let modules = modules.get_or_compute(|| {
                    stats.module_scans += 1;
                    resolve_modules(bundled, registry)
                });
                stats.plugin_scans += 1;
                resolve_plugins(bundled, registry, modules)
            })
            .as_slice()
    }
}

fn resolve_modules(bundled: &BundledLocations, registry: &PathRegistry) -> ModuleMap {
    let mut modules = ModuleMap::default();
    modules.insert(CORE_MODULE.to_string(), bundled.core_module.clone());

    for path in registry.module_paths() {
        if let Some(name) = base_name(path) {
            modules.insert(name, with_trailing_separator(path));
        }
    }

    for (dir, filter) in registry.module_dirs() {
        match filter {
            ModuleFilter::Names(names) => {
                for name in names {
                    modules.insert(name.clone(), child_dir(dir, name));
                }
            }
            ModuleFilter::All => {
                for name in module_subdirectories(dir) {
                    let path = child_dir(dir, &name);
                    modules.insert(name, path);
                }
            }
        }
    }

    debug!("Resolved {} modules", modules.len());
    modules
}

/// Module names found in `dir`; nothing if unreadable
fn module_subdirectories(dir: &Path) -> Vec<String> {
    match subdirectory_names(dir) {
        Ok(names) => {
            trace!("Found modules {:?} in {:?}", names, dir);
            names
        }
        Err(e) => {
            warn!("Cannot scan modules dir {:?}: {}", dir, e);
            Vec::new()
        }
    }
}

fn resolve_plugins(
    bundled: &BundledLocations,
    registry: &PathRegistry,
    modules: &ModuleMap,
) -> Vec<PathBuf> {
    let mut plugins: Vec<PathBuf> = Vec::new();

    for dir in registry.plugin_dirs() {
        let dir = with_trailing_separator(dir);
        if !plugins.contains(&dir) {
            plugins.push(dir);
        }
    }

    for module_path in modules.values() {
        let dir = child_dir(module_path, "plugins");
        if dir.is_dir() && !plugins.contains(&dir) {
            plugins.push(dir);
        }
    }

    if bundled.plugins.is_dir() && !plugins.contains(&bundled.plugins) {
        plugins.insert(0, bundled.plugins.clone());
    }

    debug!("Resolved {} plugin directories", plugins.len());
    plugins
}
