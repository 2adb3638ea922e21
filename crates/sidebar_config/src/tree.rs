//! # Configuration Tree
//!
//! Immutable snapshot built from one [`ConfigDocument`]. Markup is
//! normalized and every fallback is applied here, once:
//!
//! - a world or permission board with no title gets the default title
//! - a world or permission board with no lines gets the default lines
//! - a permission board without a permission node is skipped
//! - a disabled feature loads no boards at all
//!
//! Resolution never consults the document again.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use crate::document::{BoardSection, ConfigDocument};
use crate::markup::MarkupNormalizer;

/// Title of the default board when the document sets none.
pub const DEFAULT_TITLE: &str = "&b&lSidebar";

/// Title and ordered lines of one board. Text is already normalized.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DisplayConfig {
    title: String,
    lines: Vec<String>,
}

impl DisplayConfig {
    /// Creates a board configuration from normalized text.
    #[must_use]
    pub fn new(title: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            title: title.into(),
            lines,
        }
    }

    /// Board title.
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Board lines, top to bottom.
    #[inline]
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// A board bound to one world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldDisplayConfig {
    /// World name key.
    pub world: String,
    /// The board.
    pub display: Arc<DisplayConfig>,
}

/// A board gated by a permission node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionDisplayConfig {
    /// Rule name key.
    pub name: String,
    /// Node the entity must hold.
    pub required_permission: String,
    /// This rule's own priority.
    pub priority: i32,
    /// The board.
    pub display: Arc<DisplayConfig>,
}

/// Global priorities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Priorities {
    /// Nominal permission priority. Rules rank by their own priority.
    pub permission_based: i32,
    /// Priority of a world board.
    pub world_specific: i32,
    /// Priority of the default board.
    pub default: i32,
}

/// Feature switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureFlags {
    /// World boards take part in resolution.
    pub world_specific_enabled: bool,
    /// Permission boards take part in resolution.
    pub permission_based_enabled: bool,
}

/// Non-board settings carried by the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Refresh period in ticks (at least 1).
    pub update_interval: u64,
    /// Whether lines go through the placeholder resolver.
    pub use_placeholders: bool,
    /// Default language code.
    pub language: String,
}

/// Immutable snapshot of every configuration source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigTree {
    settings: Settings,
    default: Arc<DisplayConfig>,
    by_world: BTreeMap<String, WorldDisplayConfig>,
    by_rule: BTreeMap<String, PermissionDisplayConfig>,
    priorities: Priorities,
    features: FeatureFlags,
}

impl ConfigTree {
    /// Builds the tree, normalizing markup and applying fallbacks.
    #[must_use]
    pub fn build(doc: &ConfigDocument, markup: &dyn MarkupNormalizer) -> Self {
        let settings = &doc.settings;

        let default_title = doc
            .default_scoreboard
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE);
        let default = Arc::new(DisplayConfig::new(
            markup.normalize(default_title),
            markup.normalize_all(&doc.default_scoreboard.lines),
        ));

        let features = FeatureFlags {
            world_specific_enabled: settings.enable_world_specific,
            permission_based_enabled: settings.enable_permission_based,
        };

        let mut by_world = BTreeMap::new();
        if features.world_specific_enabled {
            for (world, section) in &doc.world_scoreboards {
                by_world.insert(
                    world.clone(),
                    WorldDisplayConfig {
                        world: world.clone(),
                        display: inherit(section, &default, markup),
                    },
                );
            }
        }

        let mut by_rule = BTreeMap::new();
        if features.permission_based_enabled {
            for (name, section) in &doc.permission_scoreboards {
                let Some(permission) = section.permission.as_deref().filter(|p| !p.is_empty()) else {
                    warn!(rule = %name, "permission board has no permission node, skipping it; fix it in the configuration file");
                    continue;
                };
                by_rule.insert(
                    name.clone(),
                    PermissionDisplayConfig {
                        name: name.clone(),
                        required_permission: permission.to_owned(),
                        priority: section.priority.unwrap_or(0),
                        display: inherit(section, &default, markup),
                    },
                );
            }
        }

        let update_interval = if settings.update_interval == 0 {
            warn!("update-interval must be at least 1 tick, using 1");
            1
        } else {
            settings.update_interval
        };

        Self {
            settings: Settings {
                update_interval,
                use_placeholders: settings.use_placeholders,
                language: settings.language.clone(),
            },
            default,
            by_world,
            by_rule,
            priorities: Priorities {
                permission_based: settings.priority_order.permission_based,
                world_specific: settings.priority_order.world_specific,
                default: settings.priority_order.default,
            },
            features,
        }
    }

    /// Non-board settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The default board.
    #[must_use]
    pub fn default_display(&self) -> &Arc<DisplayConfig> {
        &self.default
    }

    /// World boards keyed by world name.
    #[must_use]
    pub fn by_world(&self) -> &BTreeMap<String, WorldDisplayConfig> {
        &self.by_world
    }

    /// Permission boards keyed by rule name.
    #[must_use]
    pub fn by_rule(&self) -> &BTreeMap<String, PermissionDisplayConfig> {
        &self.by_rule
    }

    /// Global priorities.
    #[must_use]
    pub const fn priorities(&self) -> Priorities {
        self.priorities
    }

    /// Feature switches.
    #[must_use]
    pub const fn features(&self) -> FeatureFlags {
        self.features
    }
}

fn inherit(
    section: &BoardSection,
    default: &DisplayConfig,
    markup: &dyn MarkupNormalizer,
) -> Arc<DisplayConfig> {
    let title = match section.title.as_deref() {
        Some(title) if !title.is_empty() => markup.normalize(title),
        _ => default.title().to_owned(),
    };
    let lines = if section.lines.is_empty() {
        default.lines().to_vec()
    } else {
        markup.normalize_all(&section.lines)
    };
    Arc::new(DisplayConfig::new(title, lines))
}
