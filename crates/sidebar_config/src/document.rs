//! # Configuration Document
//!
//! The TOML file exactly as the operator writes it. Every key is optional;
//! missing keys take the defaults below and missing sections are empty.
//!
//! ```toml
//! [settings]
//! update-interval = 20
//! use-placeholders = true
//! language = "en_US"
//! enable-world-specific = true
//! enable-permission-based = true
//!
//! [settings.priority-order]
//! permission-based = 100
//! world-specific = 50
//! default = 0
//!
//! [default-scoreboard]
//! title = "&b&lSidebar"
//! lines = ["&7Welcome", "&fOnline: %online%"]
//!
//! [world-scoreboards.world_nether]
//! title = "&cNether"
//!
//! [permission-scoreboards.vip]
//! permission = "sidebar.vip"
//! priority = 200
//! lines = ["&6VIP"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use sidebar_shared::DEFAULT_UPDATE_INTERVAL_TICKS;

/// Root of the configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConfigDocument {
    /// Global settings.
    pub settings: SettingsSection,
    /// Board shown when nothing more specific applies.
    pub default_scoreboard: BoardSection,
    /// Boards keyed by world name.
    pub world_scoreboards: BTreeMap<String, BoardSection>,
    /// Boards keyed by rule name, each gated by a permission.
    pub permission_scoreboards: BTreeMap<String, BoardSection>,
}

/// `[settings]`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SettingsSection {
    /// Refresh period in ticks.
    pub update_interval: u64,
    /// Whether lines go through the placeholder resolver.
    pub use_placeholders: bool,
    /// Default language code for the message lookup.
    pub language: String,
    /// Whether world boards take part in resolution.
    pub enable_world_specific: bool,
    /// Whether permission boards take part in resolution.
    pub enable_permission_based: bool,
    /// The three global priorities.
    pub priority_order: PriorityOrder,
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL_TICKS,
            use_placeholders: true,
            language: "en_US".to_owned(),
            enable_world_specific: true,
            enable_permission_based: true,
            priority_order: PriorityOrder::default(),
        }
    }
}

/// `[settings.priority-order]`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PriorityOrder {
    /// Nominal priority of permission boards (rules carry their own).
    pub permission_based: i32,
    /// Priority of a world board.
    pub world_specific: i32,
    /// Priority of the default board.
    pub default: i32,
}

impl Default for PriorityOrder {
    fn default() -> Self {
        Self {
            permission_based: 100,
            world_specific: 50,
            default: 0,
        }
    }
}

/// One board section (default, world or permission).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BoardSection {
    /// Title; absent or empty inherits the default title.
    pub title: Option<String>,
    /// Lines; empty inherits the default lines.
    pub lines: Vec<String>,
    /// Required permission node (permission boards only).
    pub permission: Option<String>,
    /// Rule priority (permission boards only, default 0).
    pub priority: Option<i32>,
}

impl ConfigDocument {
    /// Parses a document from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or mistyped values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not a valid document.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let doc = ConfigDocument::from_toml_str("").unwrap();

        assert_eq!(doc.settings.update_interval, 20);
        assert!(doc.settings.use_placeholders);
        assert_eq!(doc.settings.language, "en_US");
        assert!(doc.settings.enable_world_specific);
        assert!(doc.settings.enable_permission_based);
        assert_eq!(doc.settings.priority_order, PriorityOrder::default());
        assert!(doc.world_scoreboards.is_empty());
        assert!(doc.permission_scoreboards.is_empty());
    }

    #[test]
    fn test_kebab_case_keys() {
        let doc = ConfigDocument::from_toml_str(
            r#"
            [settings]
            update-interval = 40
            enable-world-specific = false

            [settings.priority-order]
            world-specific = 75

            [default-scoreboard]
            title = "T"
            lines = ["A", "B"]

            [world-scoreboards.world_nether]
            title = "Nether"

            [permission-scoreboards.vip]
            permission = "rank.vip"
            priority = 200
            "#,
        )
        .unwrap();

        assert_eq!(doc.settings.update_interval, 40);
        assert!(!doc.settings.enable_world_specific);
        assert_eq!(doc.settings.priority_order.world_specific, 75);
        assert_eq!(doc.settings.priority_order.permission_based, 100);
        assert_eq!(doc.default_scoreboard.lines, vec!["A", "B"]);
        assert_eq!(doc.world_scoreboards["world_nether"].title.as_deref(), Some("Nether"));
        assert_eq!(doc.permission_scoreboards["vip"].priority, Some(200));
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let err = ConfigDocument::from_toml_str("[settings]\nupdate-interval = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ConfigDocument::from_path("/definitely/not/here/sidebar.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
