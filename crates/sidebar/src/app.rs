//! # Bootstrap
//!
//! Builds every component once and passes dependencies explicitly. There
//! is no global instance: the host keeps the [`Sidebar`] and hands its
//! parts to whoever needs them.
//!
//! ```text
//! ConfigSource ─load─► ConfigTree ─► ConfigResolver ─┐
//!                                                    ├─► EntityBoardRegistry ─► RefreshScheduler
//! SchedulerPort, EntityDirectory, Renderer, ... ─────┘          │
//!                                                 BoardLifecycle, ConfigReloader, BoardCommand
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sidebar_config::{ConfigResolver, ConfigSource, ConfigTree, MarkupNormalizer};
use sidebar_scheduler::SchedulerPort;
use tracing::{info, warn};

use crate::command::BoardCommand;
use crate::directory::EntityDirectory;
use crate::error::SidebarResult;
use crate::lifecycle::BoardLifecycle;
use crate::placeholder::PlaceholderResolver;
use crate::registry::{BoardCollaborators, EntityBoardRegistry};
use crate::reload::ConfigReloader;
use crate::render::{Capabilities, Renderer};

/// Everything the host provides.
pub struct SidebarSetup {
    /// Where configuration is read from.
    pub source: Arc<dyn ConfigSource>,
    /// The scheduler selected for this process.
    pub scheduler: Arc<dyn SchedulerPort>,
    /// Currently connected entities.
    pub directory: Arc<dyn EntityDirectory>,
    /// Display backend.
    pub renderer: Arc<dyn Renderer>,
    /// Placeholder backend, if one is installed.
    pub placeholders: Option<Arc<dyn PlaceholderResolver>>,
    /// Markup normalizer for configured text.
    pub markup: Arc<dyn MarkupNormalizer>,
    /// Detected host features.
    pub capabilities: Capabilities,
}

/// The running board engine.
pub struct Sidebar {
    registry: Arc<EntityBoardRegistry>,
    lifecycle: BoardLifecycle,
    reloader: Arc<ConfigReloader>,
    commands: BoardCommand,
    shut_down: AtomicBool,
}

impl Sidebar {
    /// Loads configuration, wires the components and starts refreshing.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial configuration cannot be loaded.
    pub fn start(setup: SidebarSetup) -> SidebarResult<Self> {
        let SidebarSetup {
            source,
            scheduler,
            directory,
            renderer,
            placeholders,
            markup,
            capabilities,
        } = setup;

        let document = source.load()?;
        let tree = ConfigTree::build(&document, markup.as_ref());
        let resolver = Arc::new(ConfigResolver::new(tree));

        let registry = Arc::new(EntityBoardRegistry::new(
            resolver,
            Arc::clone(&scheduler),
            directory,
            BoardCollaborators {
                renderer,
                placeholders,
                markup,
                capabilities,
            },
        ));
        let reloader = Arc::new(ConfigReloader::new(Arc::clone(&source), Arc::clone(&registry)));
        let commands = BoardCommand::new(Arc::clone(&registry), Arc::clone(&reloader));
        let lifecycle = BoardLifecycle::new(Arc::clone(&registry));

        if !registry.start_refresh() {
            warn!("boards will not refresh until the configuration is reloaded");
        }

        let caps = registry.capabilities();
        info!(
            scheduler = %scheduler.kind(),
            source = %source.describe(),
            placeholders = caps.placeholders,
            legacy_bridge = caps.legacy_bridge,
            rgb = caps.rgb,
            constrained_lines = caps.line_policy().is_constrained(),
            "sidebar started"
        );

        Ok(Self {
            registry,
            lifecycle,
            reloader,
            commands,
            shut_down: AtomicBool::new(false),
        })
    }

    /// The board registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<EntityBoardRegistry> {
        &self.registry
    }

    /// Connection-event hooks.
    #[must_use]
    pub fn lifecycle(&self) -> &BoardLifecycle {
        &self.lifecycle
    }

    /// Configuration reloader.
    #[must_use]
    pub fn reloader(&self) -> &Arc<ConfigReloader> {
        &self.reloader
    }

    /// Command surface.
    #[must_use]
    pub fn commands(&self) -> &BoardCommand {
        &self.commands
    }

    /// Destroys every board and stops refreshing. Later calls do nothing.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.registry.unregister_all();
        info!("sidebar stopped");
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }
}

impl Drop for Sidebar {
    fn drop(&mut self) {
        self.shutdown();
    }
}
