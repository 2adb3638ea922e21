//! # Config Error Types

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a configuration document.
///
/// Missing sections are not errors; they simply produce no candidates.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read configuration {}: {source}", path.display())]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid TOML or has wrongly typed values.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
