//! Path normalisation helpers and the application directory layout

use crate::{CoreError, Result};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{is_separator, Path, PathBuf, MAIN_SEPARATOR_STR};
use tracing::{trace, warn};

/// Resolve `path` to a canonical absolute directory.
///
/// Fails with [`CoreError::InvalidDirectory`] when the path does not exist or
/// is not a directory.
pub fn canonical_dir(path: &Path) -> Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(canonical) if canonical.is_dir() => {
            trace!("Canonicalised {:?} to {:?}", path, canonical);
            Ok(canonical)
        }
        _ => Err(CoreError::invalid_directory(path)),
    }
}

/// Append the platform separator unless the path already ends with one
pub fn with_trailing_separator(path: &Path) -> PathBuf {
    let raw = path.as_os_str();
    if raw.to_string_lossy().ends_with(is_separator) {
        return path.to_path_buf();
    }
    let mut owned = OsString::from(raw);
    owned.push(MAIN_SEPARATOR_STR);
    PathBuf::from(owned)
}

/// Join `name` onto `dir` and end the result with a separator
pub fn child_dir(dir: &Path, name: &str) -> PathBuf {
    with_trailing_separator(&dir.join(name))
}

/// Last component of a directory path, used as a module name
pub fn base_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

/// Entries starting with a dot never name a module
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Names of the visible sub-directories of `dir`, in directory order.
///
/// Hidden entries and plain files are skipped. Names that are not valid
/// UTF-8 cannot name a module or plugin and are skipped with a warning.
pub fn subdirectory_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)?.flatten() {
        if !entry.path().is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) if is_hidden(&name) => {}
            Ok(name) => names.push(name),
            Err(raw) => warn!("Skipping {:?} in {:?}: name is not valid UTF-8", raw, dir),
        }
    }
    Ok(names)
}

/// Directory layout of an application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Application root
    pub app: PathBuf,
    /// Public web directory
    pub www: PathBuf,
    /// Writable data directory
    pub var: PathBuf,
    /// Log directory
    pub log: PathBuf,
    /// Local configuration directory
    pub config: PathBuf,
    /// Entry point scripts
    pub scripts: PathBuf,
}

impl AppPaths {
    /// Derive every directory from the application root
    pub fn new(app: impl Into<PathBuf>) -> Self {
        Self::from_parts(app, None, None, None, None, None)
    }

    /// Build the layout, falling back to the conventional location for each
    /// directory that is not given. `log` and `config` default to
    /// sub-directories of `var`, whether `var` is given or derived.
    pub fn from_parts(
        app: impl Into<PathBuf>,
        www: Option<PathBuf>,
        var: Option<PathBuf>,
        log: Option<PathBuf>,
        config: Option<PathBuf>,
        scripts: Option<PathBuf>,
    ) -> Self {
        let app = with_trailing_separator(&app.into());
        let var = var.unwrap_or_else(|| child_dir(&app, "var"));
        Self {
            www: www.unwrap_or_else(|| child_dir(&app, "www")),
            log: log.unwrap_or_else(|| child_dir(&var, "log")),
            config: config.unwrap_or_else(|| child_dir(&var, "config")),
            scripts: scripts.unwrap_or_else(|| child_dir(&app, "scripts")),
            var,
            app,
        }
    }

    /// Path of a file or directory relative to the application root
    pub fn app_file(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.app.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_canonical_dir_rejects_missing_and_files() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        assert!(canonical_dir(temp_dir.path()).is_ok());
        assert!(matches!(
            canonical_dir(&temp_dir.path().join("missing")),
            Err(CoreError::InvalidDirectory { .. })
        ));
        assert!(matches!(
            canonical_dir(&file),
            Err(CoreError::InvalidDirectory { .. })
        ));
    }

    #[test]
    fn test_trailing_separator_is_added_once() {
        let once = with_trailing_separator(Path::new("/srv/app"));
        let twice = with_trailing_separator(&once);

        assert!(once.to_string_lossy().ends_with(MAIN_SEPARATOR_STR));
        assert_eq!(once.as_os_str(), twice.as_os_str());
    }

    #[test]
    fn test_base_name_and_hidden() {
        assert_eq!(base_name(Path::new("/srv/modules/news")).as_deref(), Some("news"));
        assert!(is_hidden(".git"));
        assert!(!is_hidden("news"));
    }

    #[test]
    fn test_subdirectory_names() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("news")).unwrap();
        fs::create_dir_all(temp_dir.path().join(".git")).unwrap();
        fs::write(temp_dir.path().join("README"), "").unwrap();

        assert_eq!(subdirectory_names(temp_dir.path()).unwrap(), vec!["news".to_string()]);
        assert!(subdirectory_names(&temp_dir.path().join("missing")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_subdirectory_names_skips_non_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("news")).unwrap();
        fs::create_dir_all(temp_dir.path().join(OsStr::from_bytes(b"caf\xe9"))).unwrap();

        assert_eq!(subdirectory_names(temp_dir.path()).unwrap(), vec!["news".to_string()]);
    }

    #[test]
    fn test_app_paths_defaults() {
        let paths = AppPaths::new("/srv/app");

        assert_eq!(paths.www, PathBuf::from("/srv/app/www"));
        assert_eq!(paths.var, PathBuf::from("/srv/app/var"));
        assert_eq!(paths.log, PathBuf::from("/srv/app/var/log"));
        assert_eq!(paths.config, PathBuf::from("/srv/app/var/config"));
        assert_eq!(paths.scripts, PathBuf::from("/srv/app/scripts"));
    }

    #[test]
    fn test_app_paths_log_follows_custom_var() {
        let paths = AppPaths::from_parts(
            "/srv/app",
            None,
            Some(PathBuf::from("/data/var/")),
            None,
            None,
            None,
        );

        assert_eq!(paths.log, PathBuf::from("/data/var/log"));
        assert_eq!(paths.config, PathBuf::from("/data/var/config"));
        assert_eq!(paths.app_file("modules/testapp"), PathBuf::from("/srv/app/modules/testapp"));
    }
}
