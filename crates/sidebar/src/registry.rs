//! # Entity Board Registry
//!
//! One live display surface per connected entity, plus the set of entities
//! that hid their board.
//!
//! ## Design
//!
//! ```text
//!   boards:      DashMap<EntityId, Box<dyn DisplaySurface>>
//!   toggled_off: DashSet<EntityId>
//!
//!   invariant: id in boards  =>  id not in toggled_off
//!   invariant: at most one surface per id
//! ```
//!
//! Both maps are sharded concurrent maps: under the regionized scheduler
//! every entity's update may run on a different region thread at the same
//! time. Content is resolved and rendered before the entity's shard is
//! locked; the lock is held only to push the finished title or lines.
//!
//! Nothing here returns an error. Renderer and placeholder failures are
//! logged for the entity concerned and the next refresh is the retry.

use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use sidebar_config::{ConfigResolver, MarkupNormalizer};
use sidebar_scheduler::{RepeatingTask, SchedulerPort};
use sidebar_shared::{EntityContext, EntityId, REFRESH_INITIAL_DELAY_TICKS};
use tracing::{debug, error, info, warn};

use crate::directory::EntityDirectory;
use crate::error::RenderError;
use crate::placeholder::PlaceholderResolver;
use crate::refresh::RefreshScheduler;
use crate::render::{Capabilities, DisplaySurface, Renderer, SurfaceOptions};

/// External collaborators that turn configuration into pixels.
pub struct BoardCollaborators {
    /// Creates display surfaces.
    pub renderer: Arc<dyn Renderer>,
    /// Fills dynamic values into lines, when installed.
    pub placeholders: Option<Arc<dyn PlaceholderResolver>>,
    /// Normalizes markup after substitution.
    pub markup: Arc<dyn MarkupNormalizer>,
    /// Detected host features.
    pub capabilities: Capabilities,
}

/// Owner of every entity's board.
pub struct EntityBoardRegistry {
    resolver: Arc<ConfigResolver>,
    scheduler: Arc<dyn SchedulerPort>,
    directory: Arc<dyn EntityDirectory>,
    renderer: Arc<dyn Renderer>,
    placeholders: Option<Arc<dyn PlaceholderResolver>>,
    markup: Arc<dyn MarkupNormalizer>,
    capabilities: Capabilities,
    boards: DashMap<EntityId, Box<dyn DisplaySurface>>,
    toggled_off: DashSet<EntityId>,
    refresh: RefreshScheduler,
}

impl EntityBoardRegistry {
    /// Creates an empty registry. The refresh task is not started.
    #[must_use]
    pub fn new(
        resolver: Arc<ConfigResolver>,
        scheduler: Arc<dyn SchedulerPort>,
        directory: Arc<dyn EntityDirectory>,
        collaborators: BoardCollaborators,
    ) -> Self {
        let BoardCollaborators {
            renderer,
            placeholders,
            markup,
            mut capabilities,
        } = collaborators;
        capabilities.placeholders = placeholders.is_some();

        Self {
            refresh: RefreshScheduler::new(Arc::clone(&scheduler), REFRESH_INITIAL_DELAY_TICKS),
            resolver,
            scheduler,
            directory,
            renderer,
            placeholders,
            markup,
            capabilities,
            boards: DashMap::new(),
            toggled_off: DashSet::new(),
        }
    }

    /// Creates and fills a board for `ctx`, unless it is toggled off.
    ///
    /// An existing board for the same entity is destroyed and replaced.
    pub fn create(&self, ctx: &dyn EntityContext) {
        let id = ctx.id();
        if self.toggled_off.contains(&id) {
            return;
        }

        let mut surface = match self.renderer.create(id, SurfaceOptions::from(self.capabilities)) {
            Ok(surface) => surface,
            Err(e) => {
                error!(entity = %id, error = %e, "failed to create display surface");
                return;
            }
        };

        let tree = self.resolver.snapshot();
        let config = tree.resolve(ctx);
        let title = self.render_text(ctx, config.title(), tree.settings().use_placeholders);
        if let Err(e) = surface.set_title(&title) {
            report(id, "title", &e);
        }

        if let Some(mut replaced) = self.boards.insert(id, surface) {
            replaced.destroy();
        }
        // A toggle or a disconnect may have landed between the checks above
        // and the insert; neither would see the new surface.
        if self.toggled_off.contains(&id) || !ctx.is_online() {
            self.remove(id);
            return;
        }

        debug!(entity = %id, "board created");
        self.update(ctx);
    }

    /// Destroys the board for `id`, if any. Idempotent.
    pub fn remove(&self, id: EntityId) {
        if let Some((_, mut surface)) = self.boards.remove(&id) {
            surface.destroy();
            debug!(entity = %id, "board removed");
        }
    }

    /// Pushes freshly resolved lines to the board of `ctx`, if it has one.
    pub fn update(&self, ctx: &dyn EntityContext) {
        let id = ctx.id();
        if !self.boards.contains_key(&id) {
            return;
        }

        let tree = self.resolver.snapshot();
        let use_placeholders = tree.settings().use_placeholders;
        let lines: Vec<String> = tree
            .resolve(ctx)
            .lines()
            .iter()
            .map(|line| self.render_text(ctx, line, use_placeholders))
            .collect();

        if let Some(mut surface) = self.boards.get_mut(&id) {
            if let Err(e) = surface.set_lines(&lines) {
                report(id, "lines", &e);
            }
        }
    }

    /// Updates every connected entity.
    ///
    /// Under the regionized scheduler each update is dispatched on its own
    /// so it runs where that entity may be touched; under the single loop
    /// updates run inline, one entity after another. Entities that went
    /// offline after the directory listed them are skipped on both paths.
    pub fn update_all(self: &Arc<Self>) {
        let regionized = self.scheduler.kind().is_regionized();
        for ctx in self.directory.online() {
            if !ctx.is_online() {
                continue;
            }
            if regionized {
                let registry = Arc::clone(self);
                self.scheduler
                    .run_now(Box::new(move || registry.update(ctx.as_ref())));
            } else {
                self.update(ctx.as_ref());
            }
        }
    }

    /// Flips visibility for `ctx`. Returns true if the board is now hidden.
    pub fn toggle(&self, ctx: &dyn EntityContext) -> bool {
        let id = ctx.id();
        if self.toggled_off.remove(&id).is_some() {
            self.create(ctx);
            debug!(entity = %id, "board shown");
            false
        } else {
            self.toggled_off.insert(id);
            self.remove(id);
            debug!(entity = %id, "board hidden");
            true
        }
    }

    /// Rebuilds the board of `ctx` from scratch, unless it is toggled off.
    ///
    /// Used when the entity's context changed and the title must be
    /// resolved again.
    pub fn refresh(&self, ctx: &dyn EntityContext) {
        if self.toggled_off.contains(&ctx.id()) {
            return;
        }
        self.remove(ctx.id());
        self.create(ctx);
    }

    /// Rebuilds the board of every connected entity that is not toggled off.
    ///
    /// Returns the number of entities refreshed.
    pub fn recreate_visible(&self) -> usize {
        let mut count = 0;
        for ctx in self.directory.online() {
            if !self.is_toggled(ctx.id()) {
                self.refresh(ctx.as_ref());
                count += 1;
            }
        }
        count
    }

    /// Destroys every board and cancels the refresh task.
    pub fn unregister_all(&self) {
        let mut destroyed = 0usize;
        self.boards.retain(|_, surface| {
            surface.destroy();
            destroyed += 1;
            false
        });
        let cancelled = self.refresh.stop().is_some();
        info!(destroyed, refresh_cancelled = cancelled, "all boards unregistered");
    }

    /// Whether `id` hid its board.
    #[must_use]
    pub fn is_toggled(&self, id: EntityId) -> bool {
        self.toggled_off.contains(&id)
    }

    /// Whether `id` currently has a board.
    #[must_use]
    pub fn has_board(&self, id: EntityId) -> bool {
        self.boards.contains_key(&id)
    }

    /// Number of live boards.
    #[must_use]
    pub fn board_count(&self) -> usize {
        self.boards.len()
    }

    /// Starts the repeating refresh with the configured interval.
    ///
    /// Returns false if the scheduler refused it (logged).
    pub fn start_refresh(self: &Arc<Self>) -> bool {
        let period = self.resolver.snapshot().settings().update_interval;
        self.refresh.start(self.refresh_task(), period)
    }

    /// Cancels and re-registers the refresh with the current interval.
    pub fn reload_refresh(self: &Arc<Self>) -> bool {
        let period = self.resolver.snapshot().settings().update_interval;
        self.refresh.reload(self.refresh_task(), period)
    }

    /// The refresh registration.
    #[must_use]
    pub fn refresh_scheduler(&self) -> &RefreshScheduler {
        &self.refresh
    }

    /// The resolver boards are built from.
    #[must_use]
    pub fn resolver(&self) -> &Arc<ConfigResolver> {
        &self.resolver
    }

    /// The scheduler in use.
    #[must_use]
    pub fn scheduler(&self) -> &Arc<dyn SchedulerPort> {
        &self.scheduler
    }

    /// The connected-entity directory.
    #[must_use]
    pub fn directory(&self) -> &Arc<dyn EntityDirectory> {
        &self.directory
    }

    /// The markup normalizer.
    #[must_use]
    pub fn markup(&self) -> &Arc<dyn MarkupNormalizer> {
        &self.markup
    }

    /// Detected host features.
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn refresh_task(self: &Arc<Self>) -> RepeatingTask {
        let weak = Arc::downgrade(self);
        Arc::new(move || {
            if let Some(registry) = weak.upgrade() {
                registry.update_all();
            }
        })
    }

    fn render_text(&self, ctx: &dyn EntityContext, text: &str, use_placeholders: bool) -> String {
        let substituted = match &self.placeholders {
            Some(resolver) if use_placeholders => match resolver.substitute(ctx, text) {
                Ok(out) => out,
                Err(e) => {
                    warn!(entity = %ctx.id(), line = text, error = %e, "placeholder substitution failed, showing line as written");
                    text.to_owned()
                }
            },
            _ => text.to_owned(),
        };
        self.markup.normalize(&substituted)
    }
}

fn report(id: EntityId, part: &str, e: &RenderError) {
    match e {
        RenderError::MalformedText(_) => {
            warn!(entity = %id, part, error = %e, "board text rejected; fix it in the configuration file");
        }
        RenderError::SurfaceGone => {
            debug!(entity = %id, part, "board destroyed before it could be written");
        }
        RenderError::Backend(_) => {
            warn!(entity = %id, part, error = %e, "renderer failed to update board");
        }
    }
}
