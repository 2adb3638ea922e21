//! # Configuration Sources
//!
//! Where a [`ConfigDocument`] comes from. The reload command asks the
//! source again; if that fails the running tree stays in place.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::debug;

use crate::document::ConfigDocument;
use crate::error::ConfigResult;

/// Produces configuration documents on demand.
pub trait ConfigSource: Send + Sync {
    /// Loads the current document.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::ConfigError) if the document cannot
    /// be read or parsed.
    fn load(&self) -> ConfigResult<ConfigDocument>;

    /// Human-readable origin, for logs.
    fn describe(&self) -> String;
}

/// A TOML file on disk, re-read on every load.
#[derive(Clone, Debug)]
pub struct TomlFileSource {
    path: PathBuf,
}

impl TomlFileSource {
    /// Source backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for TomlFileSource {
    fn load(&self) -> ConfigResult<ConfigDocument> {
        debug!(path = %self.path.display(), "loading configuration");
        ConfigDocument::from_path(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// An in-memory document that can be swapped at runtime.
#[derive(Debug, Default)]
pub struct StaticSource {
    document: RwLock<ConfigDocument>,
}

impl StaticSource {
    /// Source that serves `document`.
    #[must_use]
    pub fn new(document: ConfigDocument) -> Self {
        Self {
            document: RwLock::new(document),
        }
    }

    /// Parses `text` into a source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`](crate::ConfigError::Parse) on invalid TOML.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        ConfigDocument::from_toml_str(text).map(Self::new)
    }

    /// Serves `document` from the next load on.
    pub fn replace(&self, document: ConfigDocument) {
        *self.document.write() = document;
    }
}

impl ConfigSource for StaticSource {
    fn load(&self) -> ConfigResult<ConfigDocument> {
        Ok(self.document.read().clone())
    }

    fn describe(&self) -> String {
        "in-memory".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn test_missing_file_is_io_error() {
        let source = TomlFileSource::new("/nonexistent/sidebar.toml");
        match source.load() {
            Err(ConfigError::Io { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/sidebar.toml"));
            }
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn test_file_source_reads_current_contents() {
        let path = std::env::temp_dir().join(format!("sidebar-source-{}.toml", std::process::id()));
        std::fs::write(&path, "[settings]\nupdate-interval = 40\n").unwrap();
        let source = TomlFileSource::new(&path);
        assert_eq!(source.load().unwrap().settings.update_interval, 40);

        std::fs::write(&path, "[settings]\nupdate-interval = 10\n").unwrap();
        assert_eq!(source.load().unwrap().settings.update_interval, 10);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_static_source_replace() {
        let source = StaticSource::from_toml_str("[default-scoreboard]\ntitle = \"A\"").unwrap();
        assert_eq!(source.load().unwrap().default_scoreboard.title.as_deref(), Some("A"));

        let mut next = ConfigDocument::default();
        next.default_scoreboard.title = Some("B".into());
        source.replace(next);
        assert_eq!(source.load().unwrap().default_scoreboard.title.as_deref(), Some("B"));
        assert_eq!(source.describe(), "in-memory");
    }
}
