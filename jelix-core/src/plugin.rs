//! Plugin instantiation through factories linked ahead of time

use crate::config::AppConfig;
use crate::{CoreError, Result};
use rustc_hash::FxHashMap;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Argument handed to a plugin constructor
pub type PluginArg = serde_json::Value;

/// Builds a plugin instance
pub type PluginFactory =
    Arc<dyn Fn(Option<&PluginArg>) -> Box<dyn Any + Send + Sync> + Send + Sync>;

/// Maps a plugin kind and name to the factory building it
#[derive(Clone, Default)]
pub struct PluginRegistry {
    factories: FxHashMap<(String, String), PluginFactory>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Link the factory of plugin `name` of the given kind, replacing any
    /// previous one
    pub fn register<T, F>(&mut self, kind: impl Into<String>, name: impl Into<String>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(Option<&PluginArg>) -> T + Send + Sync + 'static,
    {
        let key = (kind.into(), name.into());
        debug!("Linked plugin factory {}/{}", key.0, key.1);
        let factory: PluginFactory =
            Arc::new(move |arg: Option<&PluginArg>| -> Box<dyn Any + Send + Sync> {
                Box::new(factory(arg))
            });
        self.factories.insert(key, factory);
    }

    /// Whether a factory is linked for the plugin
    pub fn is_linked(&self, kind: &str, name: &str) -> bool {
        self.factories
            .contains_key(&(kind.to_string(), name.to_string()))
    }

    /// Instantiate a plugin listed in the configuration.
    ///
    /// Returns `Ok(None)` when the kind is unknown, the plugin is not listed
    /// or its file `<dir>/<name><file_suffix>` is missing. A plugin that is
    /// present on disk but cannot be built is an error.
    pub fn load<T: Any>(
        &self,
        config: &AppConfig,
        name: &str,
        kind: &str,
        file_suffix: &str,
        arg: Option<&PluginArg>,
    ) -> Result<Option<T>> {
        let Some(dir) = config.plugin_dir(kind, name) else {
            trace!("Plugin {}/{} is not listed", kind, name);
            return Ok(None);
        };
        let file = dir.join(format!("{}{}", name, file_suffix));
        if !file.is_file() {
            trace!("Plugin file {:?} does not exist", file);
            return Ok(None);
        }

        let factory = self
            .factories
            .get(&(kind.to_string(), name.to_string()))
            .ok_or_else(|| CoreError::PluginNotLinked {
                kind: kind.to_string(),
                name: name.to_string(),
            })?;

        factory(arg)
            .downcast::<T>()
            .map(|plugin| Some(*plugin))
            .map_err(|_| CoreError::PluginTypeMismatch {
                kind: kind.to_string(),
                name: name.to_string(),
                expected: type_name::<T>(),
            })
    }
}
