//! Raw module and plugin declarations

use crate::paths::canonical_dir;
use crate::Result;
use indexmap::{IndexMap, IndexSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which sub-directories of a declared modules directory are modules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModuleFilter {
    /// Every immediate sub-directory not starting with a dot
    #[default]
    All,
    /// Only the listed names, whether or not they exist on disk
    Names(IndexSet<String>),
}

impl ModuleFilter {
    /// Admit only the given module names
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ModuleFilter::Names(names.into_iter().map(Into::into).collect())
    }
}

impl From<Option<ModuleFilter>> for ModuleFilter {
    fn from(filter: Option<ModuleFilter>) -> Self {
        filter.unwrap_or_default()
    }
}

/// Declared module directories, module paths and plugin directories.
///
/// Every stored path is canonical and was an existing directory when it was
/// declared. The registry holds no derived data: resolution lives in
/// [`crate::Resolver`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathRegistry {
    module_dirs: IndexMap<PathBuf, ModuleFilter>,
    module_paths: Vec<PathBuf>,
    plugin_dirs: Vec<PathBuf>,
}

impl PathRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a directory containing modules.
    ///
    /// Declaring the same directory again replaces its filter but keeps its
    /// original position.
    pub fn declare_modules_dir(&mut self, path: &Path, filter: ModuleFilter) -> Result<()> {
        let dir = canonical_dir(path)?;
        debug!("Declared modules dir {:?} ({:?})", dir, filter);
        self.module_dirs.insert(dir, filter);
        Ok(())
    }

    /// Declare several module directories, each scanned in full.
    ///
    /// Nothing is stored unless every path is valid.
    pub fn declare_modules_dirs<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<()> {
        let dirs = canonical_dirs(paths)?;
        for dir in dirs {
            debug!("Declared modules dir {:?}", dir);
            self.module_dirs.insert(dir, ModuleFilter::All);
        }
        Ok(())
    }

    /// Declare the directories of individual modules
    pub fn declare_modules<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<()> {
        let dirs = canonical_dirs(paths)?;
        debug!("Declared modules {:?}", dirs);
        self.module_paths.extend(dirs);
        Ok(())
    }

    /// Declare directories containing plugins
    pub fn declare_plugins_dirs<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<()> {
        let dirs = canonical_dirs(paths)?;
        debug!("Declared plugins dirs {:?}", dirs);
        self.plugin_dirs.extend(dirs);
        Ok(())
    }

    /// Forget every declaration
    pub fn clear(&mut self) {
        self.module_dirs.clear();
        self.module_paths.clear();
        self.plugin_dirs.clear();
        debug!("Cleared module and plugin declarations");
    }

    /// Declared module directories with their filters, in declaration order
    pub fn module_dirs(&self) -> &IndexMap<PathBuf, ModuleFilter> {
        &self.module_dirs
    }

    /// Explicitly declared module directories, in declaration order
    pub fn module_paths(&self) -> &[PathBuf] {
        &self.module_paths
    }

    /// Explicitly declared plugin directories, in declaration order
    pub fn plugin_dirs(&self) -> &[PathBuf] {
        &self.plugin_dirs
    }

    /// Whether nothing has been declared
    pub fn is_empty(&self) -> bool {
        self.module_dirs.is_empty() && self.module_paths.is_empty() && self.plugin_dirs.is_empty()
    }
}

fn canonical_dirs<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>> {
    paths.iter().map(|path| canonical_dir(path.as_ref())).collect()
}
