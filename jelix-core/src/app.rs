//! The application instance: the handle every core operation goes through

use crate::config::AppConfig;
use crate::context::{ContextStack, ResolutionState};
use crate::paths::AppPaths;
use crate::plugin::{PluginArg, PluginRegistry};
use crate::registry::ModuleFilter;
use crate::resolver::{BundledLocations, ModuleMap, Resolver, ResolverStats};
use crate::{CoreError, Result};
use std::any::Any;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Module and plugin resolution state of one application.
///
/// Declarations invalidate the resolution caches; queries recompute them on
/// demand. [`AppInstance::save_context`] and [`AppInstance::restore_context`]
/// swap the whole state in and out.
#[derive(Debug)]
pub struct AppInstance {
    state: ResolutionState,
    contexts: ContextStack,
    plugins: PluginRegistry,
}

impl AppInstance {
    /// Create an instance with no declaration and no configuration
    pub fn new(paths: AppPaths, bundled: BundledLocations) -> Self {
        Self {
            state: ResolutionState::new(paths, Resolver::new(bundled)),
            contexts: ContextStack::new(),
            plugins: PluginRegistry::new(),
        }
    }

    /// Application directory layout
    pub fn paths(&self) -> &AppPaths {
        &self.state.paths
    }

    /// Move the application to another layout
    pub fn set_paths(&mut self, paths: AppPaths) {
        self.state.paths = paths;
        self.state.version.take();
    }

    /// Version from the `VERSION` file of the application, `"0"` if absent.
    ///
    /// `SERIAL` is replaced by `0` and line breaks are dropped.
    pub fn version(&self) -> Result<&str> {
        let version = self.state.version.get_or_try_init(|| {
            let file = self.state.paths.app_file("VERSION");
            match fs::read_to_string(&file) {
                Ok(content) => Ok(content.replace("SERIAL", "0").replace('\n', "").trim().to_string()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok("0".to_string()),
                Err(source) => Err(CoreError::Io { path: file, source }),
            }
        })?;
        Ok(version.as_str())
    }

    /// Configuration of the running entry point
    pub fn config(&self) -> Option<&AppConfig> {
        self.state.config.as_ref()
    }

    /// Use `config` as the configuration of the running entry point
    pub fn set_config(&mut self, config: AppConfig) {
        info!(
            "Configuration set: {} enabled modules, {} external",
            config.modules.len(),
            config.external_modules.len()
        );
        self.state.config = Some(config);
    }

    /// Factories used by [`AppInstance::load_plugin`]
    pub fn plugin_registry(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Factories, for linking new plugins
    pub fn plugin_registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.plugins
    }

    /// Declare a directory containing modules
    pub fn declare_modules_dir(
        &mut self,
        path: impl AsRef<Path>,
        filter: impl Into<ModuleFilter>,
    ) -> Result<()> {
        self.state
            .registry
            .declare_modules_dir(path.as_ref(), filter.into())?;
        self.state.resolver.invalidate();
        Ok(())
    }

    /// Declare several directories whose sub-directories are all modules
    pub fn declare_modules_dirs<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<()> {
        self.state.registry.declare_modules_dirs(paths)?;
        self.state.resolver.invalidate();
        Ok(())
    }

    /// Declared module directories, in declaration order
    pub fn declared_modules_dirs(&self) -> Vec<PathBuf> {
        self.state.registry.module_dirs().keys().cloned().collect()
    }

    /// Declare the directory of one module
    pub fn declare_module(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.declare_modules(&[path])
    }

    /// Declare the directories of several modules, all or none
    pub fn declare_modules<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<()> {
        self.state.registry.declare_modules(paths)?;
        self.state.resolver.invalidate();
        Ok(())
    }

    /// Declare a directory containing plugins. The `plugins/` directories of
    /// modules are found without being declared.
    pub fn declare_plugins_dir(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.declare_plugins_dirs(&[path])
    }

    /// Declare several plugin directories, all or none
    pub fn declare_plugins_dirs<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<()> {
        self.state.registry.declare_plugins_dirs(paths)?;
        self.state.resolver.invalidate_plugins();
        Ok(())
    }

    /// Forget every declared module and plugin directory
    pub fn clear_modules_plugins_path(&mut self) {
        self.state.registry.clear();
        self.state.resolver.invalidate();
    }

    /// Every known module, enabled or not, with the core module first
    pub fn all_modules_path(&mut self) -> &ModuleMap {
        let ResolutionState { registry, resolver, .. } = &mut self.state;
        resolver.all_modules_path(registry)
    }

    /// Every directory that may contain plugins, including those of disabled
    /// modules
    pub fn all_plugins_path(&mut self) -> &[PathBuf] {
        let ResolutionState { registry, resolver, .. } = &mut self.state;
        resolver.all_plugins_path(registry)
    }

    /// Module map if it is currently cached
    pub fn cached_modules_path(&self) -> Option<&ModuleMap> {
        self.state.resolver.index().modules.get()
    }

    /// Plugin directories if they are currently cached
    pub fn cached_plugins_path(&self) -> Option<&[PathBuf]> {
        self.state.resolver.index().plugins.get().map(Vec::as_slice)
    }

    /// Cache recomputation counters
    pub fn resolver_stats(&self) -> ResolverStats {
        self.state.resolver.stats()
    }

    /// Rebuild the plugin lists of the configuration from
    /// [`AppInstance::all_plugins_path`], creating an empty configuration if
    /// none is set
    pub fn refresh_plugin_lists(&mut self) {
        let dirs = self.all_plugins_path().to_vec();
        let config = self.state.config.get_or_insert_with(AppConfig::default);
        config.plugins.clear();
        config.discover_plugins(&dirs);
        debug!("Plugin lists rebuilt from {} directories", dirs.len());
    }

    /// Instantiate a plugin. `Ok(None)` means the plugin does not exist.
    pub fn load_plugin<T: Any>(
        &self,
        name: &str,
        kind: &str,
        file_suffix: &str,
        arg: Option<&PluginArg>,
    ) -> Result<Option<T>> {
        match &self.state.config {
            Some(config) => self.plugins.load(config, name, kind, file_suffix, arg),
            None => Ok(None),
        }
    }

    /// Whether `module` is enabled for this entry point, or, with
    /// `include_external`, in another one
    pub fn is_module_enabled(&self, module: &str, include_external: bool) -> Result<bool> {
        let config = self.loaded_config()?;
        if include_external && config.external_modules.contains_key(module) {
            return Ok(true);
        }
        Ok(config.modules.contains_key(module))
    }

    /// Path of an enabled module
    pub fn get_module_path(&self, module: &str, include_external: bool) -> Result<&Path> {
        let config = self.loaded_config()?;
        if let Some(path) = config.modules.get(module) {
            return Ok(path.as_path());
        }
        if include_external {
            if let Some(path) = config.external_modules.get(module) {
                return Ok(path.as_path());
            }
        }
        Err(CoreError::UnknownModule {
            name: module.to_string(),
        })
    }

    fn loaded_config(&self) -> Result<&AppConfig> {
        self.state.config.as_ref().ok_or(CoreError::ConfigNotLoaded)
    }

    /// Enter a module
    pub fn push_current_module(&mut self, module: impl Into<String>) {
        self.state.modules.push(module);
    }

    /// Leave the current module, returning its name
    pub fn pop_current_module(&mut self) -> Option<String> {
        self.state.modules.pop()
    }

    /// Name of the module being executed, if any
    pub fn current_module(&self) -> Option<&str> {
        self.state.modules.current()
    }

    /// Save a copy of the whole state
    pub fn save_context(&mut self) {
        self.contexts.save(&self.state);
    }

    /// Replace the state with the most recently saved one
    pub fn restore_context(&mut self) -> Result<()> {
        self.state = self.contexts.restore()?;
        Ok(())
    }

    /// Number of saved contexts
    pub fn context_depth(&self) -> usize {
        self.contexts.depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn app(temp_dir: &TempDir) -> AppInstance {
        AppInstance::new(
            AppPaths::new(temp_dir.path()),
            BundledLocations::from_lib_path(temp_dir.path().join("lib")),
        )
    }

    #[test]
    fn test_version_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut instance = app(&temp_dir);
        assert_eq!(instance.version().unwrap(), "0");

        fs::write(temp_dir.path().join("VERSION"), "1.2.SERIAL\n").unwrap();
        assert_eq!(instance.version().unwrap(), "0", "version is read once");

        instance.set_paths(AppPaths::new(temp_dir.path()));
        assert_eq!(instance.version().unwrap(), "1.2.0");
    }

    #[test]
    fn test_enabled_modules_need_config() {
        let temp_dir = TempDir::new().unwrap();
        let mut instance = app(&temp_dir);
        assert!(matches!(
            instance.is_module_enabled("news", false),
            Err(CoreError::ConfigNotLoaded)
        ));

        let mut config = AppConfig::default();
        config.enable_module("news", "/srv/app/modules/news/");
        config.enable_external_module("admin", "/srv/app/admin/");
        instance.set_config(config);

        assert!(instance.is_module_enabled("news", false).unwrap());
        assert!(!instance.is_module_enabled("admin", false).unwrap());
        assert!(instance.is_module_enabled("admin", true).unwrap());

        assert_eq!(
            instance.get_module_path("admin", true).unwrap(),
            Path::new("/srv/app/admin/")
        );
        assert!(matches!(
            instance.get_module_path("admin", false),
            Err(CoreError::UnknownModule { .. })
        ));
    }

    #[test]
    fn test_plugin_declaration_keeps_module_cache() {
        let temp_dir = TempDir::new().unwrap();
        let mut instance = app(&temp_dir);
        instance.all_plugins_path();
        assert_eq!(instance.resolver_stats().module_scans, 1);

        instance.declare_plugins_dir(temp_dir.path()).unwrap();
        instance.all_plugins_path();
        assert_eq!(instance.resolver_stats().module_scans, 1);
        assert_eq!(instance.resolver_stats().plugin_scans, 2);
        assert!(instance.state.resolver.index().modules.is_populated());
    }

    #[test]
    fn test_load_plugin_without_config_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let instance = app(&temp_dir);
        let plugin: Option<String> = instance.load_plugin("auth", "coord", ".coord.rs", None).unwrap();
        assert!(plugin.is_none());
    }
}
