//! Application configuration consumed by the resolution core

use crate::paths::{child_dir, subdirectory_names};
use crate::{CoreError, Result};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Enabled modules and plugin lists of one entry point
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Modules enabled for this entry point
    #[serde(default)]
    pub modules: IndexMap<String, PathBuf>,

    /// Modules enabled in another entry point of the application
    #[serde(default)]
    pub external_modules: IndexMap<String, PathBuf>,

    /// Plugin kind -> (plugin name -> plugin directory)
    #[serde(default)]
    pub plugins: FxHashMap<String, IndexMap<String, PathBuf>>,
}

impl AppConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content).map_err(|source| CoreError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            "Loaded configuration {:?}: {} modules, {} plugin kinds",
            path,
            config.modules.len(),
            config.plugins.len()
        );
        Ok(config)
    }

    /// Enable a module for this entry point
    pub fn enable_module(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.modules.insert(name.into(), path.into());
    }

    /// Declare a module as enabled in another entry point
    pub fn enable_external_module(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.external_modules.insert(name.into(), path.into());
    }

    /// Directory of the plugin `name` of the given kind
    pub fn plugin_dir(&self, kind: &str, name: &str) -> Option<&Path> {
        self.plugins.get(kind)?.get(name).map(PathBuf::as_path)
    }

    /// Fill the plugin lists from plugin directories laid out as
    /// `<dir>/<kind>/<name>/`. Directories are searched in the given order and
    /// the first one providing a plugin wins.
    pub fn discover_plugins(&mut self, dirs: &[PathBuf]) {
        for dir in dirs {
            for kind in visible_subdirectories(dir) {
                let kind_dir = dir.join(&kind);
                let found = self.plugins.entry(kind).or_default();
                for name in visible_subdirectories(&kind_dir) {
                    let path = child_dir(&kind_dir, &name);
                    found.entry(name).or_insert(path);
                }
            }
        }
        trace!("Discovered plugins: {:?}", self.plugins);
    }
}

fn visible_subdirectories(dir: &Path) -> Vec<String> {
    subdirectory_names(dir).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_toml() {
        let config = AppConfig::from_toml_str(
            r#"
[modules]
news = "/srv/app/modules/news/"

[external_modules]
admin = "/srv/app/admin-modules/admin/"

[plugins.coord]
auth = "/srv/lib/plugins/coord/auth/"
"#,
        )
        .unwrap();

        assert_eq!(config.modules["news"], PathBuf::from("/srv/app/modules/news/"));
        assert!(config.external_modules.contains_key("admin"));
        assert_eq!(
            config.plugin_dir("coord", "auth"),
            Some(Path::new("/srv/lib/plugins/coord/auth/"))
        );
        assert_eq!(config.plugin_dir("coord", "missing"), None);
        assert_eq!(config.plugin_dir("db", "auth"), None);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_from_file_reports_errors() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.toml");
        assert!(matches!(AppConfig::from_file(&missing), Err(CoreError::Io { .. })));

        let broken = temp_dir.path().join("broken.toml");
        fs::write(&broken, "modules = [").unwrap();
        assert!(matches!(
            AppConfig::from_file(&broken),
            Err(CoreError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_discover_plugins_first_dir_wins() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("first");
        let second = temp_dir.path().join("second");
        fs::create_dir_all(first.join("coord").join("auth")).unwrap();
        fs::create_dir_all(second.join("coord").join("auth")).unwrap();
        fs::create_dir_all(second.join("db").join("sqlite3")).unwrap();
        fs::create_dir_all(second.join(".hidden").join("x")).unwrap();

        let mut config = AppConfig::default();
        config.discover_plugins(&[first.clone(), second.clone()]);

        assert_eq!(
            config.plugin_dir("coord", "auth"),
            Some(child_dir(&first.join("coord"), "auth").as_path())
        );
        assert!(config.plugin_dir("db", "sqlite3").is_some());
        assert!(!config.plugins.contains_key(".hidden"));
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_plugins_skips_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        let coord = temp_dir.path().join("coord");
        fs::create_dir_all(coord.join("auth")).unwrap();
        fs::create_dir_all(coord.join(OsStr::from_bytes(b"caf\xe9"))).unwrap();

        let mut config = AppConfig::default();
        config.discover_plugins(&[temp_dir.path().to_path_buf()]);

        assert_eq!(config.plugins["coord"].len(), 1);
        assert_eq!(
            config.plugin_dir("coord", "auth"),
            Some(child_dir(&coord, "auth").as_path())
        );
    }
}
