//! Error types for module and plugin resolution

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for resolution results
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the resolution core
#[derive(Error, Debug)]
pub enum CoreError {
    /// A declared path does not resolve to an existing directory
    #[error("Given directory {path} does not exist")]
    InvalidDirectory {
        /// The path as it was given by the caller
        path: PathBuf,
    },

    /// The module is absent from every consulted module list
    #[error("Unknown module: {name}")]
    UnknownModule {
        /// Name of the module that was looked up
        name: String,
    },

    /// `restore_context` was called without a matching `save_context`
    #[error("No saved context to restore")]
    EmptyContextStack,

    /// Enabled-module lookups need a configuration
    #[error("Configuration is not loaded")]
    ConfigNotLoaded,

    /// The plugin file exists but no factory was linked for it
    #[error("Plugin {kind}/{name} has no registered factory")]
    PluginNotLinked {
        /// Plugin kind
        kind: String,
        /// Plugin name
        name: String,
    },

    /// The linked factory built a value of another type
    #[error("Plugin {kind}/{name} is not a {expected}")]
    PluginTypeMismatch {
        /// Plugin kind
        kind: String,
        /// Plugin name
        name: String,
        /// Type name the caller asked for
        expected: &'static str,
    },

    /// I/O error while reading an application file
    #[error("IO error reading {path}: {source}")]
    Io {
        /// Path of the file that failed to read
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML
    #[error("Invalid configuration {path}: {source}")]
    ConfigParse {
        /// Path of the configuration file
        path: PathBuf,
        /// The underlying TOML error
        #[source]
        source: toml::de::Error,
    },
}

impl CoreError {
    /// Build an [`CoreError::InvalidDirectory`] for the given path
    pub fn invalid_directory(path: impl Into<PathBuf>) -> Self {
        CoreError::InvalidDirectory { path: path.into() }
    }
}
