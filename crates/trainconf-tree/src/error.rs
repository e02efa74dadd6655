//! Error types for trainconf-tree

use std::path::PathBuf;

/// Result type for trainconf-tree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or editing a configuration tree
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No configuration file path was given")]
    EmptyPath,

    #[error("Configuration file {path} does not exist")]
    NotFound { path: PathBuf },

    #[error("Unsupported document format '{extension}' for {path} (expected yaml, yml, json or toml)")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} document at {path}: {message}")]
    Parse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Failed to serialize configuration as {format}: {message}")]
    Serialize { format: String, message: String },

    #[error("`_base_` in {path} must be a path string, found {found}")]
    InvalidBase { path: PathBuf, found: &'static str },

    #[error("Inheritance cycle detected: {path} is its own base")]
    InheritanceCycle { path: PathBuf },

    #[error("Invalid key path '{path}': {message}")]
    InvalidKeyPath { path: String, message: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
