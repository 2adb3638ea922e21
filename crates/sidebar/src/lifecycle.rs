//! # Connection Lifecycle Hooks
//!
//! What the host calls on connect, disconnect and world change.
//!
//! | Event          | Action                                       |
//! |----------------|----------------------------------------------|
//! | connect        | `create` after [`JOIN_DELAY_TICKS`]           |
//! | disconnect     | `remove`, immediately                        |
//! | world change   | `refresh` after [`WORLD_CHANGE_DELAY_TICKS`], only with world boards enabled |

use std::sync::Arc;

use sidebar_shared::{EntityId, SharedContext, JOIN_DELAY_TICKS, WORLD_CHANGE_DELAY_TICKS};
use tracing::trace;

use crate::registry::EntityBoardRegistry;

/// Connection-event entry points.
#[derive(Clone)]
pub struct BoardLifecycle {
    registry: Arc<EntityBoardRegistry>,
}

impl BoardLifecycle {
    /// Hooks that act on `registry`.
    #[must_use]
    pub fn new(registry: Arc<EntityBoardRegistry>) -> Self {
        Self { registry }
    }

    /// Schedules board creation after the join grace delay.
    ///
    /// Skipped if the entity disconnected in the meantime.
    pub fn on_connect(&self, ctx: SharedContext) {
        trace!(entity = %ctx.id(), "entity connected");
        let registry = Arc::clone(&self.registry);
        self.registry.scheduler().run_after_delay(
            Box::new(move || {
                if ctx.is_online() {
                    registry.create(ctx.as_ref());
                }
            }),
            JOIN_DELAY_TICKS,
        );
    }

    /// Destroys the entity's board.
    pub fn on_disconnect(&self, id: EntityId) {
        trace!(entity = %id, "entity disconnected");
        self.registry.remove(id);
    }

    /// Schedules a rebuild after a world change, if world boards are on.
    pub fn on_context_change(&self, ctx: SharedContext) {
        if !self.registry.resolver().snapshot().features().world_specific_enabled {
            return;
        }
        let registry = Arc::clone(&self.registry);
        self.registry.scheduler().run_after_delay(
            Box::new(move || registry.refresh(ctx.as_ref())),
            WORLD_CHANGE_DELAY_TICKS,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::OnlineEntities;
    use crate::memory::MemoryRenderer;
    use crate::registry::BoardCollaborators;
    use crate::render::Capabilities;
    use parking_lot::RwLock;
    use sidebar_config::{ConfigDocument, ConfigResolver, ConfigTree, Passthrough};
    use sidebar_scheduler::SingleLoopScheduler;
    use sidebar_shared::{EntityContext, PlayerContext};

    /// Context whose world can move under the registry.
    struct Roaming {
        id: EntityId,
        world: RwLock<String>,
    }

    impl EntityContext for Roaming {
        fn id(&self) -> EntityId {
            self.id
        }
        fn world_name(&self) -> String {
            self.world.read().clone()
        }
        fn has_permission(&self, _: &str) -> bool {
            false
        }
    }

    const WORLDS: &str = r#"
        [default-scoreboard]
        title = "Lobby"
        lines = ["a"]
        [world-scoreboards.nether]
        title = "Nether"
    "#;

    fn setup(toml: &str) -> (BoardLifecycle, Arc<SingleLoopScheduler>, MemoryRenderer) {
        let doc = ConfigDocument::from_toml_str(toml).unwrap();
        let scheduler = Arc::new(SingleLoopScheduler::new());
        let renderer = MemoryRenderer::new();
        let registry = Arc::new(EntityBoardRegistry::new(
            Arc::new(ConfigResolver::new(ConfigTree::build(&doc, &Passthrough))),
            scheduler.clone(),
            Arc::new(OnlineEntities::new()),
            BoardCollaborators {
                renderer: Arc::new(renderer.clone()),
                placeholders: None,
                markup: Arc::new(Passthrough),
                capabilities: Capabilities::default(),
            },
        ));
        (BoardLifecycle::new(registry), scheduler, renderer)
    }

    #[test]
    fn test_connect_waits_for_grace_delay() {
        let (hooks, scheduler, renderer) = setup(WORLDS);
        let ctx = PlayerContext::new(EntityId::from_u128(1), "world").shared();

        hooks.on_connect(Arc::clone(&ctx));
        for _ in 1..JOIN_DELAY_TICKS {
            scheduler.tick();
        }
        assert!(renderer.live(ctx.id()).is_none());

        scheduler.tick();
        assert_eq!(renderer.live(ctx.id()).unwrap().title.as_deref(), Some("Lobby"));
    }

    #[test]
    fn test_connect_skipped_when_gone() {
        let (hooks, scheduler, renderer) = setup(WORLDS);
        let mut player = PlayerContext::new(EntityId::from_u128(1), "world");
        player.online = false;

        hooks.on_connect(player.shared());
        for _ in 0..JOIN_DELAY_TICKS {
            scheduler.tick();
        }

        assert_eq!(renderer.created_count(), 0);
    }

    #[test]
    fn test_world_change_rebuilds_title() {
        let (hooks, scheduler, renderer) = setup(WORLDS);
        let roaming = Arc::new(Roaming {
            id: EntityId::from_u128(7),
            world: RwLock::new("world".into()),
        });
        let ctx: SharedContext = roaming.clone();

        hooks.on_connect(Arc::clone(&ctx));
        for _ in 0..JOIN_DELAY_TICKS {
            scheduler.tick();
        }

        *roaming.world.write() = "nether".into();
        hooks.on_context_change(Arc::clone(&ctx));
        scheduler.tick();

        let snap = renderer.live(roaming.id).unwrap();
        assert_eq!(snap.title.as_deref(), Some("Nether"));
        assert_eq!(snap.lines, vec!["a"]);
    }

    #[test]
    fn test_world_change_ignored_when_disabled() {
        let (hooks, scheduler, renderer) =
            setup(&format!("[settings]\nenable-world-specific = false\n{WORLDS}"));
        let ctx = PlayerContext::new(EntityId::from_u128(1), "world").shared();

        hooks.on_connect(Arc::clone(&ctx));
        for _ in 0..JOIN_DELAY_TICKS {
            scheduler.tick();
        }
        hooks.on_context_change(Arc::clone(&ctx));
        scheduler.tick();

        assert_eq!(renderer.created_count(), 1);
    }

    #[test]
    fn test_disconnect_removes_immediately() {
        let (hooks, scheduler, renderer) = setup(WORLDS);
        let ctx = PlayerContext::new(EntityId::from_u128(1), "world").shared();

        hooks.on_connect(Arc::clone(&ctx));
        for _ in 0..JOIN_DELAY_TICKS {
            scheduler.tick();
        }
        hooks.on_disconnect(ctx.id());

        assert!(renderer.live(ctx.id()).is_none());
    }
}
