//! # Configuration Reload
//!
//! Reload order, each step only after the previous one succeeded:
//!
//! 1. load the document from its source (failure keeps the running tree)
//! 2. build the new tree and swap it in whole
//! 3. cancel and re-register the refresh task with the new interval
//! 4. rebuild the board of every connected entity that is not toggled off

use std::sync::Arc;

use sidebar_config::{ConfigSource, ConfigTree};
use tracing::{info, warn};

use crate::error::SidebarResult;
use crate::registry::EntityBoardRegistry;

/// What a successful reload did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReloadSummary {
    /// Refresh interval now in effect, in ticks.
    pub update_interval: u64,
    /// Boards rebuilt.
    pub recreated: usize,
    /// Whether the refresh task was re-registered.
    pub refresh_running: bool,
}

/// Re-reads configuration and applies it to live boards.
pub struct ConfigReloader {
    source: Arc<dyn ConfigSource>,
    registry: Arc<EntityBoardRegistry>,
}

impl ConfigReloader {
    /// Reloader reading from `source` into `registry`.
    #[must_use]
    pub fn new(source: Arc<dyn ConfigSource>, registry: Arc<EntityBoardRegistry>) -> Self {
        Self { source, registry }
    }

    /// Where configuration is read from.
    #[must_use]
    pub fn source(&self) -> &Arc<dyn ConfigSource> {
        &self.source
    }

    /// Reloads configuration and rebuilds visible boards.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be loaded. Nothing has
    /// changed in that case.
    pub fn reload(&self) -> SidebarResult<ReloadSummary> {
        let document = self.source.load().map_err(|e| {
            warn!(source = %self.source.describe(), error = %e, "reload failed, keeping current configuration");
            e
        })?;

        let tree = ConfigTree::build(&document, self.registry.markup().as_ref());
        let update_interval = tree.settings().update_interval;
        self.registry.resolver().replace(tree);

        let refresh_running = self.registry.reload_refresh();
        let recreated = self.registry.recreate_visible();

        info!(source = %self.source.describe(), update_interval, recreated, "configuration reloaded");
        Ok(ReloadSummary {
            update_interval,
            recreated,
            refresh_running,
        })
    }
}
